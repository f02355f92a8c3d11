//! Bower: install, then record the offline listing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{node_network_rule, node_permission_rule};
use crate::constants::LOCK_SUFFIX;
use crate::job::classify::{Classifier, Rule};
use crate::job::{
    ErrorKind, Job, JobBase, JobErrors, PHASE_GRAPH, PHASE_INSTALL, PHASE_LOCK, StatusSink, ToolCommand, ToolContext,
};
use crate::resolution::registry::Ecosystem;

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "Bower",
        "To install it, run `npm install --global bower`.",
        vec![
            Rule::new(ErrorKind::DependencyNotFound, r"ENOTFOUND Package (\S+) not found", |caps| {
                format!("Couldn't find the package {} in the Bower registry. Please check bower.json.", &caps[1])
            }),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"(?:ENORESTARGET No tag found that was able to satisfy (\S+)|ECONFLICT Unable to find suitable version for (\S+))",
                |caps| {
                    let target = caps.get(1).or_else(|| caps.get(2)).map_or("a dependency", |m| m.as_str());
                    format!("No version satisfies {target}. Please check the version ranges in bower.json.")
                },
            ),
            node_network_rule(),
            node_permission_rule(),
            Rule::new(ErrorKind::MalformedManifest, r"EMALFORMED Failed to read (\S+)", |caps| {
                format!("{} is not valid JSON. Please fix the syntax error reported above.", &caps[1])
            }),
        ],
    )
});

pub struct BowerJob {
    base: JobBase,
    ctx: ToolContext,
}

impl BowerJob {
    pub fn new(file: impl Into<PathBuf>, ctx: ToolContext) -> Self {
        Self {
            base: JobBase::new(file),
            ctx,
        }
    }

    fn bower(&self) -> ToolCommand {
        ToolCommand::new(self.ctx.tool("bower")).current_dir(self.base.dir())
    }
}

#[async_trait]
impl Job for BowerJob {
    fn file(&self) -> &Path {
        self.base.file()
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Bower
    }

    fn errors(&self) -> &JobErrors {
        self.base.errors()
    }

    async fn run(&mut self, status: &StatusSink) {
        self.base.enter(status, PHASE_INSTALL);
        let install = self.bower().args([
            "install",
            "--save",
            "--save-dev",
            "--save-exact",
            "--allow-root",
            "--config.interactive=false",
        ]);
        if self.base.exec(&self.ctx, install, &CLASSIFIER).await.is_none() {
            return;
        }

        self.base.enter(status, PHASE_GRAPH);
        let list = self.bower().args(["list", "--offline"]);
        let Some(listing) = self.base.exec(&self.ctx, list, &CLASSIFIER).await else {
            return;
        };

        self.base.enter(status, PHASE_LOCK);
        let lock = self.base.dir().join(format!("bower.{LOCK_SUFFIX}"));
        self.base.write_artifact(&lock, &listing.stdout);
    }
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(BowerJob::new(file, ctx))
}
