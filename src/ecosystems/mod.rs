//! Per-ecosystem jobs and failure classification.
//!
//! Every module exposes `job(file, ctx)`, the builder used by
//! [`PerFileStrategy`](crate::resolution::strategy::PerFileStrategy), and a
//! `CLASSIFIER` rule table. Gradle is the exception: it has its own
//! [`GradleStrategy`](gradle::GradleStrategy) because one settings file
//! fans out into a job per module.
//!
//! | module        | shape                  | artifact                              |
//! |---------------|------------------------|---------------------------------------|
//! | [`yarn`]      | install-then-emit      | `yarn.lock`                           |
//! | [`npm`]       | install-then-emit      | `package-lock.json`                   |
//! | [`composer`]  | install-then-emit      | `composer.lock`                       |
//! | [`cargo`]     | install-then-emit      | `Cargo.lock`                          |
//! | [`uv`]        | install-then-emit      | `uv.lock`                             |
//! | [`maven`]     | single command         | `maven.debricked.lock`                |
//! | [`sbt`]       | pom, then maven        | `sbt.debricked.lock`                  |
//! | [`gomod`]     | graph + list           | `gomod.debricked.lock`                |
//! | [`bower`]     | install + list         | `bower.debricked.lock`                |
//! | [`nuget`]     | restore                | `packages.lock.json` or hidden lock   |
//! | [`pip`]       | venv, install, inspect | `.<manifest>.pip.debricked.lock`      |
//! | [`gradle`]    | multi-module           | `gradle.debricked.lock` per module    |

pub mod bower;
pub mod cargo;
pub mod composer;
pub mod gomod;
pub mod gradle;
pub mod maven;
pub mod npm;
pub mod nuget;
pub mod pip;
pub mod sbt;
pub mod uv;
pub mod yarn;

use crate::job::classify::{Rule, group, network_documentation, permission_documentation};
use crate::job::ErrorKind;

/// DNS and connection failures as reported by Node-based tools.
pub(crate) fn node_network_rule() -> Rule {
    Rule::new(
        ErrorKind::RegistryUnreachable,
        r"(?:getaddrinfo|connect|request to \S+ failed, reason:) ?(?:ENOTFOUND|EAI_AGAIN|ETIMEDOUT|ECONNREFUSED|ECONNRESET) ?([\w.\-]+)?",
        |caps| network_documentation(group(caps, 1, "the package registry")),
    )
}

/// `EACCES` as reported by Node-based tools.
pub(crate) fn node_permission_rule() -> Rule {
    Rule::new(ErrorKind::PermissionDenied, r"EACCES: permission denied, \w+ '([^']+)'", |caps| {
        permission_documentation(group(caps, 1, "the project directory"))
    })
}

/// Maven-family failures, shared by maven and sbt.
pub(crate) fn maven_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            ErrorKind::DependencyNotFound,
            r"Could not find artifact ([^\s]+) in (\S+)",
            |caps| {
                format!(
                    "Failed to find the artifact {} in {}. Please check that the dependency coordinates are correct \
                     and that the repository is configured in the POM or settings.xml.",
                    &caps[1], &caps[2]
                )
            },
        ),
        Rule::new(
            ErrorKind::DependencyNotFound,
            r"Failure to find ([^\s]+) in (\S+)",
            |caps| {
                format!(
                    "Failed to find the artifact {} in {}. The failure may be cached locally; run with -U or clear \
                     ~/.m2/repository once the artifact is available.",
                    &caps[1], &caps[2]
                )
            },
        ),
        Rule::new(
            ErrorKind::VersionNotSatisfiable,
            r"Could not resolve version conflict(?: among \[([^\]]*)\])?",
            |caps| {
                format!(
                    "No version satisfies every constraint among {}. Align the conflicting versions, for example \
                     with dependencyManagement.",
                    group(caps, 1, "the declared dependencies")
                )
            },
        ),
        Rule::new(
            ErrorKind::RegistryUnreachable,
            r"(?:Could not transfer artifact \S+ from/to \S+ \(([^)]+)\)|UnknownHostException: ?([\w.\-]+)|Connect to ([\w.\-:]+) .*failed)",
            |caps| {
                let host = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)).map_or("the Maven repository", |m| m.as_str());
                network_documentation(host)
            },
        ),
        Rule::new(
            ErrorKind::MalformedManifest,
            r"(?:Non-parseable POM ([^:]+)|Malformed POM ([^:]+)|The project \S* ?\(([^)]+)\) has \d+ errors?)",
            |caps| {
                let pom = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)).map_or("pom.xml", |m| m.as_str());
                format!("The POM {pom} could not be parsed. Please check that it is valid XML and a valid Maven model.")
            },
        ),
        Rule::new(ErrorKind::PermissionDenied, r"(\S+) \(Permission denied\)", |caps| {
            permission_documentation(&caps[1])
        }),
        Rule::new(
            ErrorKind::ToolInternalFailure,
            r"Failed to execute goal ([^\s]+)",
            |caps| {
                format!(
                    "The Maven goal {} failed. Run the same command with -e or -X in the project directory for details.",
                    &caps[1]
                )
            },
        ),
    ]
}
