//! Composer: `composer update` writes `composer.lock` without installing.

use std::path::PathBuf;
use std::sync::LazyLock;

use crate::job::classify::{Classifier, Rule, group, network_documentation, permission_documentation};
use crate::job::install::{InstallJob, InstallRecipe};
use crate::job::{ErrorKind, Job, JobBase, PHASE_INSTALL, ToolCommand, ToolContext};
use crate::resolution::registry::Ecosystem;

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "Composer",
        "See https://getcomposer.org/download/ for installation instructions.",
        vec![
            Rule::new(
                ErrorKind::DependencyNotFound,
                r"requires (\S+) ([^,\s]+), it could not be found in any version",
                |caps| {
                    format!(
                        "Couldn't find the package {} in any version. Please check the name in composer.json, and \
                         that any custom repository it comes from is configured and reachable.",
                        &caps[1]
                    )
                },
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"requires (\S+) ([^,\s]+), found \S+ but (?:it does not match|these were not loaded)",
                |caps| {
                    format!(
                        "No version of {} satisfies {}. Please relax the constraint in composer.json.",
                        &caps[1], &caps[2]
                    )
                },
            ),
            Rule::new(
                ErrorKind::RegistryUnreachable,
                r#"(?:The "(https?://[^"]+)" file could not be downloaded|curl error \d+ while downloading (\S+))"#,
                |caps| {
                    let url = caps.get(1).or_else(|| caps.get(2)).map_or("the Composer repository", |m| m.as_str());
                    network_documentation(url)
                },
            ),
            Rule::new(
                ErrorKind::MalformedManifest,
                r#""([^"]*composer\.json)" does not (?:contain valid JSON|match the expected JSON schema)"#,
                |caps| {
                    format!("{} could not be parsed. Please fix the error reported above.", group(caps, 1, "composer.json"))
                },
            ),
            Rule::new(
                ErrorKind::PermissionDenied,
                r"(?:file_put_contents|fopen|mkdir)\(([^)]+)\):[^\n]*Permission denied",
                |caps| permission_documentation(&caps[1]),
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"Your requirements could not be resolved to an installable set of packages",
                |_| {
                    "The requirements in composer.json conflict with each other. Please read the problems listed \
                     above and adjust the constraints."
                        .to_string()
                },
            ),
        ],
    )
});

pub static RECIPE: InstallRecipe = InstallRecipe {
    ecosystem: Ecosystem::Composer,
    phase: PHASE_INSTALL,
    classifier: &CLASSIFIER,
    command,
    artifact: "composer.lock",
};

fn command(base: &JobBase, ctx: &ToolContext) -> ToolCommand {
    ToolCommand::new(ctx.tool("composer"))
        .args([
            "update",
            "--no-interaction",
            "--no-scripts",
            "--ignore-platform-reqs",
            "--no-plugins",
            "--no-autoloader",
            "--no-install",
        ])
        .current_dir(base.dir())
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(InstallJob::new(file, &RECIPE, ctx))
}
