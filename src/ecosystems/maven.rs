//! Maven: the dependency plugin writes the tree in TGF format.

use std::path::PathBuf;
use std::sync::LazyLock;

use super::maven_rules;
use crate::constants::MAVEN_LOCK_FILE;
use crate::job::classify::Classifier;
use crate::job::install::{InstallJob, InstallRecipe};
use crate::job::{Job, JobBase, PHASE_GRAPH, ToolCommand, ToolContext};
use crate::resolution::registry::Ecosystem;

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new("Maven", "See https://maven.apache.org/install.html for installation instructions.", maven_rules())
});

pub static RECIPE: InstallRecipe = InstallRecipe {
    ecosystem: Ecosystem::Maven,
    phase: PHASE_GRAPH,
    classifier: &CLASSIFIER,
    command,
    artifact: MAVEN_LOCK_FILE,
};

fn command(base: &JobBase, ctx: &ToolContext) -> ToolCommand {
    dependency_tree(ctx, &base.file_name(), MAVEN_LOCK_FILE).current_dir(base.dir())
}

/// `mvn dependency:tree` for `pom`, writing TGF to `output`.
pub(crate) fn dependency_tree(ctx: &ToolContext, pom: &str, output: &str) -> ToolCommand {
    ToolCommand::new(ctx.tool("mvn")).args([
        "dependency:tree".to_string(),
        format!("-DoutputFile={output}"),
        "-DoutputType=tgf".to_string(),
        "--fail-at-end".to_string(),
        "--batch-mode".to_string(),
        "-f".to_string(),
        pom.to_string(),
    ])
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(InstallJob::new(file, &RECIPE, ctx))
}
