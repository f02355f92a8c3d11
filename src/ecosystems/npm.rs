//! npm: `npm install` writes `package-lock.json` next to `package.json`.

use std::path::PathBuf;
use std::sync::LazyLock;

use super::{node_network_rule, node_permission_rule};
use crate::job::classify::{Classifier, Rule, group};
use crate::job::install::{InstallJob, InstallRecipe};
use crate::job::{ErrorKind, Job, JobBase, PHASE_INSTALL, ToolCommand, ToolContext};
use crate::resolution::registry::Ecosystem;

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "npm",
        "npm ships with Node.js, see https://nodejs.org/en/download.",
        vec![
            Rule::new(
                ErrorKind::DependencyNotFound,
                r"'([^']+)' is not in (?:the npm|this) registry",
                |caps| {
                    format!(
                        "Couldn't find the package {} in the registry. Please check the name in package.json, \
                         and that your .npmrc points at the right registry if it is private.",
                        &caps[1]
                    )
                },
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"(?:No matching version found for (\S+)|ERESOLVE (?:unable to resolve dependency tree|could not resolve))",
                |caps| {
                    format!(
                        "No version of {} satisfies the declared ranges. Please relax the version range in \
                         package.json, or resolve the peer dependency conflict reported above.",
                        group(caps, 1, "a dependency")
                    )
                },
            ),
            node_network_rule(),
            node_permission_rule(),
            Rule::new(ErrorKind::MalformedManifest, r"code EJSONPARSE", |_| {
                "package.json is not valid JSON. Please fix the syntax error reported above.".to_string()
            }),
        ],
    )
});

pub static RECIPE: InstallRecipe = InstallRecipe {
    ecosystem: Ecosystem::Npm,
    phase: PHASE_INSTALL,
    classifier: &CLASSIFIER,
    command,
    artifact: "package-lock.json",
};

fn command(base: &JobBase, ctx: &ToolContext) -> ToolCommand {
    ToolCommand::new(ctx.tool("npm"))
        .args(["install", "--ignore-scripts", "--audit=false", "--bin-links=false", "--fund=false", "--no-progress"])
        .current_dir(base.dir())
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(InstallJob::new(file, &RECIPE, ctx))
}
