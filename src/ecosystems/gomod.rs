//! Go modules: `go mod graph` plus `go list -m all`, concatenated.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::constants::LOCK_SUFFIX;
use crate::job::classify::{Classifier, Rule, group, network_documentation, permission_documentation};
use crate::job::{ErrorKind, Job, JobBase, JobErrors, PHASE_GRAPH, PHASE_LOCK, StatusSink, ToolCommand, ToolContext};
use crate::resolution::registry::Ecosystem;

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "Go",
        "See https://go.dev/doc/install for installation instructions.",
        vec![
            Rule::new(
                ErrorKind::RegistryUnreachable,
                r"(?:dial tcp: lookup ([\w.\-]+)|Get \x22?(https?://[^\s\x22:]+)[^\n]*(?:i/o timeout|connection refused|no such host))",
                |caps| {
                    let host = caps.get(1).or_else(|| caps.get(2)).map_or("the module proxy", |m| m.as_str());
                    network_documentation(host)
                },
            ),
            Rule::new(
                ErrorKind::DependencyNotFound,
                r"(?:module ([^\s:@]+)(?:@\S+)?: (?:reading \S+: 404 Not Found|not found)|go: ([^\s:@]+)@\S+: invalid version: unknown revision)",
                |caps| {
                    let module = caps.get(1).or_else(|| caps.get(2)).map_or("a module", |m| m.as_str());
                    format!(
                        "Couldn't find the module {module}. Please check the module path in go.mod; private modules \
                         need GOPRIVATE and access to their repository."
                    )
                },
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"go: ([^\s:@]+)@(\S+): (?:invalid version|no matching versions)",
                |caps| {
                    format!(
                        "No version of {} matches {}. Please check the required version in go.mod.",
                        &caps[1], &caps[2]
                    )
                },
            ),
            Rule::new(ErrorKind::MalformedManifest, r"go: errors parsing (\S+)", |caps| {
                format!("{} could not be parsed. Please fix the error reported above, for example with `go mod tidy`.", &caps[1])
            }),
            Rule::new(ErrorKind::PermissionDenied, r"open ([^:]+): permission denied", |caps| {
                permission_documentation(group(caps, 1, "the module cache"))
            }),
        ],
    )
});

pub struct GomodJob {
    base: JobBase,
    ctx: ToolContext,
}

impl GomodJob {
    pub fn new(file: impl Into<PathBuf>, ctx: ToolContext) -> Self {
        Self {
            base: JobBase::new(file),
            ctx,
        }
    }

    fn go(&self) -> ToolCommand {
        ToolCommand::new(self.ctx.tool("go")).current_dir(self.base.dir())
    }
}

#[async_trait]
impl Job for GomodJob {
    fn file(&self) -> &Path {
        self.base.file()
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Gomod
    }

    fn errors(&self) -> &JobErrors {
        self.base.errors()
    }

    async fn run(&mut self, status: &StatusSink) {
        self.base.enter(status, PHASE_GRAPH);
        let graph_cmd = self.go().args(["mod", "graph"]);
        let Some(graph) = self.base.exec(&self.ctx, graph_cmd, &CLASSIFIER).await else {
            return;
        };
        let list_cmd = self.go().args(["list", "-mod=readonly", "-e", "-m", "all"]);
        let Some(list) = self.base.exec(&self.ctx, list_cmd, &CLASSIFIER).await else {
            return;
        };

        self.base.enter(status, PHASE_LOCK);
        let lock = self.base.dir().join(format!("gomod.{LOCK_SUFFIX}"));
        let content = format!("{}\n{}", graph.stdout, list.stdout);
        self.base.write_artifact(&lock, &content);
    }
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(GomodJob::new(file, ctx))
}
