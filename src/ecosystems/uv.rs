//! uv: `uv lock` writes `uv.lock` next to `pyproject.toml`.

use std::path::PathBuf;
use std::sync::LazyLock;

use crate::job::classify::{Classifier, Rule, group, network_documentation, permission_documentation};
use crate::job::install::{InstallJob, InstallRecipe};
use crate::job::{ErrorKind, Job, JobBase, PHASE_LOCK, ToolCommand, ToolContext};
use crate::resolution::registry::Ecosystem;

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "uv",
        "See https://docs.astral.sh/uv/getting-started/installation/ for installation instructions.",
        vec![
            Rule::new(
                ErrorKind::DependencyNotFound,
                r"Because ([\w.\-\[\]]+) was not found in the package registry",
                |caps| {
                    format!(
                        "Couldn't find the package {} in the package index. Please check the name in pyproject.toml.",
                        &caps[1]
                    )
                },
            ),
            Rule::new(
                ErrorKind::RegistryUnreachable,
                r"(?:error sending request for url \(([^)]+)\)|Failed to fetch: `([^`]+)`|dns error)",
                |caps| {
                    let url = caps.get(1).or_else(|| caps.get(2)).map_or("the package index", |m| m.as_str());
                    network_documentation(url)
                },
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"No solution found when resolving dependencies(?:[^\n]*\n[^\n]*?depends on ([\w.\-]+))?",
                |caps| {
                    format!(
                        "The requirements on {} cannot be satisfied together. Please read the explanation above and \
                         adjust the version specifiers in pyproject.toml.",
                        group(caps, 1, "the project's dependencies")
                    )
                },
            ),
            Rule::new(
                ErrorKind::MalformedManifest,
                r"(?:Failed to parse: `([^`]+)`|TOML parse error)",
                |caps| {
                    format!("{} could not be parsed. Please fix the error reported above.", group(caps, 1, "pyproject.toml"))
                },
            ),
            Rule::new(ErrorKind::PermissionDenied, r"(?s)(?:at|to) `([^`]+)`.*Permission denied \(os error 13\)", |caps| {
                permission_documentation(&caps[1])
            }),
        ],
    )
});

pub static RECIPE: InstallRecipe = InstallRecipe {
    ecosystem: Ecosystem::Uv,
    phase: PHASE_LOCK,
    classifier: &CLASSIFIER,
    command,
    artifact: "uv.lock",
};

fn command(base: &JobBase, ctx: &ToolContext) -> ToolCommand {
    ToolCommand::new(ctx.tool("uv"))
        .args(["lock", "--no-progress", "--directory"])
        .arg(base.dir().display().to_string())
        .current_dir(base.dir())
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(InstallJob::new(file, &RECIPE, ctx))
}
