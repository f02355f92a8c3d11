//! sbt: generate a POM with `sbt makePom`, then let Maven resolve it.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::constants::LOCK_SUFFIX;
use crate::job::classify::{Classifier, Rule, group, network_documentation};
use crate::job::{
    ErrorKind, Job, JobBase, JobError, JobErrors, PHASE_GRAPH, StatusSink, ToolCommand, ToolContext,
};
use crate::resolution::registry::Ecosystem;

/// Phase reported while sbt writes the POM.
pub const PHASE_POM: &str = "creating pom";

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "sbt",
        "See https://www.scala-sbt.org/download/ for installation instructions.",
        vec![
            Rule::new(
                ErrorKind::DependencyNotFound,
                r"(?:unresolved dependency: ([^\s:]+:[^\s:]+:[^\s:]+)|Error downloading (\S+))",
                |caps| {
                    let coordinates = caps.get(1).or_else(|| caps.get(2)).map_or("a dependency", |m| m.as_str());
                    format!(
                        "Couldn't resolve {coordinates}. Please check the coordinates in build.sbt and that the \
                         resolver hosting it is configured."
                    )
                },
            ),
            Rule::new(
                ErrorKind::RegistryUnreachable,
                r"(?:server access error at url (\S+)|UnknownHostException: ([\w.\-]+))",
                |caps| {
                    let host = caps.get(1).or_else(|| caps.get(2)).map_or("the artifact repository", |m| m.as_str());
                    network_documentation(host)
                },
            ),
            Rule::new(ErrorKind::MalformedManifest, r"(\S*build\.sbt):(\d+): error:", |caps| {
                format!("{} has an error on line {}. Please fix it and try again.", &caps[1], &caps[2])
            }),
            Rule::new(ErrorKind::ToolInternalFailure, r"Not a valid (?:command|key): makePom", |_| {
                "sbt does not know the makePom task. Make sure the project is an sbt project with the default \
                 plugins enabled."
                    .to_string()
            }),
            Rule::new(ErrorKind::ToolInternalFailure, r"\[error\] \(([^)]+)\)", |caps| {
                format!("The sbt task {} failed. Run `sbt makePom` in the project directory for details.", group(caps, 1, "makePom"))
            }),
        ],
    )
});

#[allow(clippy::expect_used)]
static WROTE_POM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Wrote (\S+\.pom)").expect("static pattern"));

/// Path of the POM announced in sbt's output.
pub fn parse_pom_path(output: &str) -> Option<PathBuf> {
    WROTE_POM.captures(output).map(|caps| PathBuf::from(&caps[1]))
}

pub struct SbtJob {
    base: JobBase,
    ctx: ToolContext,
}

impl SbtJob {
    pub fn new(file: impl Into<PathBuf>, ctx: ToolContext) -> Self {
        Self {
            base: JobBase::new(file),
            ctx,
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.base.dir().join(format!("sbt.{LOCK_SUFFIX}"))
    }
}

#[async_trait]
impl Job for SbtJob {
    fn file(&self) -> &Path {
        self.base.file()
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Sbt
    }

    fn errors(&self) -> &JobErrors {
        self.base.errors()
    }

    async fn run(&mut self, status: &StatusSink) {
        self.base.enter(status, PHASE_POM);
        let make_pom = ToolCommand::new(self.ctx.tool("sbt")).arg("makePom").current_dir(self.base.dir());
        let command_line = make_pom.command_line();
        let Some(output) = self.base.exec(&self.ctx, make_pom, &CLASSIFIER).await else {
            return;
        };

        let Some(pom) = parse_pom_path(&output.stdout).or_else(|| parse_pom_path(&output.stderr)) else {
            self.base.record(
                JobError::critical("sbt makePom finished without reporting where it wrote the POM")
                    .with_command(command_line)
                    .with_documentation(
                        ErrorKind::ToolInternalFailure,
                        "Couldn't find the generated POM in sbt's output. Make sure `sbt makePom` works in this \
                         project and prints a line like `Wrote <path>.pom`.",
                    ),
            );
            return;
        };
        let pom = if pom.is_absolute() { pom } else { self.base.dir().join(pom) };

        self.base.enter(status, PHASE_GRAPH);
        let lock = self.lock_path();
        let tree = super::maven::dependency_tree(
            &self.ctx,
            &pom.display().to_string(),
            &lock.display().to_string(),
        )
        .current_dir(self.base.dir());
        let command_line = tree.command_line();
        if self.base.exec(&self.ctx, tree, &super::maven::CLASSIFIER).await.is_some() {
            self.base.confirm_artifact(&lock, Some(command_line));
        }
    }
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(SbtJob::new(file, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockRunner;

    const MAKE_POM_OUTPUT: &str = "[info] welcome to sbt 1.9.7\n\
                                   [info] Wrote /p/app/target/scala-2.13/app_2.13-0.1.0.pom\n\
                                   [success] Total time: 1 s";

    #[test]
    fn test_parse_pom_path() {
        assert_eq!(
            parse_pom_path(MAKE_POM_OUTPUT),
            Some(PathBuf::from("/p/app/target/scala-2.13/app_2.13-0.1.0.pom"))
        );
        assert_eq!(parse_pom_path("[success] Total time: 1 s"), None);
    }

    #[tokio::test]
    async fn test_pom_then_maven() {
        let runner = MockRunner::new().respond("sbt makePom", MAKE_POM_OUTPUT);
        let mut job = job(PathBuf::from("/p/app/build.sbt"), runner.context());
        job.run(&StatusSink::discard()).await;

        assert_eq!(
            runner.invocations(),
            vec![
                "sbt makePom".to_string(),
                "mvn dependency:tree -DoutputFile=/p/app/sbt.debricked.lock -DoutputType=tgf --fail-at-end \
                 --batch-mode -f /p/app/target/scala-2.13/app_2.13-0.1.0.pom"
                    .to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_written_tree_succeeds() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = MockRunner::new()
            .respond("sbt makePom", MAKE_POM_OUTPUT)
            .writes("mvn dependency:tree", "sbt.debricked.lock", "1 app:app:jar:0.1.0\n#\n");
        let mut job = job(temp.path().join("build.sbt"), runner.context());
        job.run(&StatusSink::discard()).await;

        assert!(job.errors().is_empty());
        assert!(temp.path().join("sbt.debricked.lock").is_file());
    }

    #[tokio::test]
    async fn test_relative_build_writes_lock_beside_it() {
        let runner = MockRunner::new().respond("sbt makePom", MAKE_POM_OUTPUT);
        let mut job = job(PathBuf::from("./app/build.sbt"), runner.context());
        job.run(&StatusSink::discard()).await;

        let tree = &runner.commands()[1];
        let cwd = tree.get_current_dir().unwrap();
        let output = tree.get_args()[1].strip_prefix("-DoutputFile=").unwrap();
        assert_eq!(cwd.join(output), std::env::current_dir().unwrap().join("app/sbt.debricked.lock"));
        // Nothing wrote the tree
        assert_eq!(job.errors().criticals()[0].kind(), ErrorKind::ToolInternalFailure);
    }

    #[tokio::test]
    async fn test_missing_wrote_line() {
        let runner = MockRunner::new().respond("sbt makePom", "[success] Total time: 1 s");
        let mut job = job(PathBuf::from("/p/app/build.sbt"), runner.context());
        job.run(&StatusSink::discard()).await;

        let error = &job.errors().criticals()[0];
        assert_eq!(error.kind(), ErrorKind::ToolInternalFailure);
        assert_eq!(error.command(), Some("sbt makePom"));
        assert_eq!(error.status(), PHASE_POM);
        assert_eq!(runner.invocations().len(), 1);
    }

    #[tokio::test]
    async fn test_maven_failure_uses_maven_rules() {
        let runner = MockRunner::new().respond("sbt makePom", MAKE_POM_OUTPUT).fail(
            "mvn",
            1,
            "[ERROR] Failed to execute goal on project app: Could not find artifact com.acme:gone:jar:1.0 in central (https://repo1.maven.org/maven2)",
        );
        let mut job = job(PathBuf::from("/p/app/build.sbt"), runner.context());
        job.run(&StatusSink::discard()).await;

        let error = &job.errors().criticals()[0];
        assert_eq!(error.kind(), ErrorKind::DependencyNotFound);
        assert_eq!(error.status(), PHASE_GRAPH);
    }
}
