//! Cargo: `cargo generate-lockfile` writes `Cargo.lock`.

use std::path::PathBuf;
use std::sync::LazyLock;

use crate::job::classify::{Classifier, Rule, group, network_documentation, permission_documentation};
use crate::job::install::{InstallJob, InstallRecipe};
use crate::job::{ErrorKind, Job, JobBase, PHASE_LOCK, ToolCommand, ToolContext};
use crate::resolution::registry::Ecosystem;

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "Cargo",
        "Install Rust with rustup, see https://rustup.rs.",
        vec![
            Rule::new(ErrorKind::DependencyNotFound, r"no matching package named `([^`]+)` found", |caps| {
                format!(
                    "Couldn't find the crate {} in the registry. Please check the name in Cargo.toml.",
                    &caps[1]
                )
            }),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"failed to select a version for the requirement `([^`]+)`",
                |caps| {
                    format!(
                        "No published version satisfies {}. Please relax the requirement in Cargo.toml.",
                        &caps[1]
                    )
                },
            ),
            Rule::new(
                ErrorKind::RegistryUnreachable,
                r"(?:failed to (?:update|query replaced source) registry `([^`]+)`|Couldn't resolve host name|spurious network error)",
                |caps| network_documentation(group(caps, 1, "crates.io")),
            ),
            Rule::new(ErrorKind::MalformedManifest, r"failed to parse manifest at `([^`]+)`", |caps| {
                format!("{} could not be parsed. Please fix the error reported above.", &caps[1])
            }),
            Rule::new(ErrorKind::PermissionDenied, r"(?s)`([^`]+)`.*Permission denied \(os error 13\)", |caps| {
                permission_documentation(&caps[1])
            }),
        ],
    )
});

pub static RECIPE: InstallRecipe = InstallRecipe {
    ecosystem: Ecosystem::Cargo,
    phase: PHASE_LOCK,
    classifier: &CLASSIFIER,
    command,
    artifact: "Cargo.lock",
};

fn command(base: &JobBase, ctx: &ToolContext) -> ToolCommand {
    ToolCommand::new(ctx.tool("cargo"))
        .args(["generate-lockfile", "--manifest-path"])
        .arg(base.path().display().to_string())
        .current_dir(base.dir())
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(InstallJob::new(file, &RECIPE, ctx))
}
