//! pip: resolve a requirements file inside a private virtual environment.
//!
//! pip has no lock format of its own, so the artifact is assembled from
//! three sections separated by a `***` line:
//!
//! 1. the requirements file as written,
//! 2. `pip list` after installing it,
//! 3. `pip show` for every listed package (names and `Requires:` edges).

mod job;

use std::path::PathBuf;
use std::sync::LazyLock;

pub use job::PipJob;

use crate::constants::SECTION_DELIMITER;
use crate::job::classify::{Classifier, Rule, group, network_documentation, permission_documentation};
use crate::job::{ErrorKind, Job, ToolContext};

/// Phase reported while the virtual environment is created.
pub const PHASE_VENV: &str = "creating virtual environment";

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "Python",
        "See https://www.python.org/downloads/ for installation instructions, or set `python` in lockforge.toml.",
        vec![
            // pip reports a failed index fetch as "from versions: none" too, so this goes first
            Rule::new(
                ErrorKind::RegistryUnreachable,
                r"(?:Could not fetch URL (\S+?):|Failed to establish a new connection|Temporary failure in name resolution|Name or service not known|ConnectTimeoutError)",
                |caps| network_documentation(group(caps, 1, "the package index")),
            ),
            Rule::new(
                ErrorKind::DependencyNotFound,
                r"Could not find a version that satisfies the requirement (\S+) \(from versions: none\)",
                |caps| {
                    format!(
                        "Couldn't find the package {} in the package index. Please check the name in the \
                         requirements file, and your index settings if it is private.",
                        &caps[1]
                    )
                },
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"Could not find a version that satisfies the requirement (\S+)",
                |caps| {
                    format!(
                        "No published version satisfies {}. Please check the version specifier in the requirements file.",
                        &caps[1]
                    )
                },
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"(?:Cannot install ([^\n]+?) because these package versions have conflicting dependencies|ResolutionImpossible)",
                |caps| {
                    format!(
                        "The requirements on {} conflict with each other. Please relax the version specifiers.",
                        group(caps, 1, "the listed packages")
                    )
                },
            ),
            Rule::new(ErrorKind::MalformedManifest, r"Invalid requirement: '([^']*)'", |caps| {
                format!("The requirement '{}' could not be parsed. Please fix the requirements file.", &caps[1])
            }),
            Rule::new(ErrorKind::PermissionDenied, r"Permission denied: '([^']+)'", |caps| {
                permission_documentation(&caps[1])
            }),
            Rule::new(ErrorKind::ToolInternalFailure, r"Failed (?:building wheel for|to build) (\S+)", |caps| {
                format!(
                    "Building {} from source failed. Install the system libraries it needs, or pin a version that \
                     ships a wheel for this platform.",
                    &caps[1]
                )
            }),
            Rule::new(ErrorKind::ToolInternalFailure, r"(?:ensurepip is not available|No module named venv)", |_| {
                "Python cannot create virtual environments. Please install the venv module, for example the \
                 python3-venv package on Debian and Ubuntu."
                    .to_string()
            }),
        ],
    )
});

/// Package names from `pip list` output, skipping its two header lines.
pub fn parse_pip_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(2)
        .filter_map(|line| line.split_whitespace().next())
        .map(ToString::to_string)
        .collect()
}

/// Join the artifact sections with the delimiter line.
pub fn join_sections(sections: &[&str]) -> String {
    sections.join(&format!("\n{SECTION_DELIMITER}\n"))
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(PipJob::new(file, ctx))
}
