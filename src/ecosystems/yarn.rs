//! Yarn: `yarn install` writes `yarn.lock` next to `package.json`.

use std::path::PathBuf;
use std::sync::LazyLock;

use super::{node_network_rule, node_permission_rule};
use crate::job::classify::{Classifier, Rule};
use crate::job::install::{InstallJob, InstallRecipe};
use crate::job::{ErrorKind, Job, JobBase, PHASE_INSTALL, ToolCommand, ToolContext};
use crate::resolution::registry::Ecosystem;

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "Yarn",
        "To install it, run `npm install --global yarn`.",
        vec![
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r#"Couldn't find any versions for "([^"]+)" that matches "([^"]+)""#,
                |caps| {
                    format!(
                        "No published version of {} satisfies \"{}\". Please check the version range in package.json.",
                        &caps[1], &caps[2]
                    )
                },
            ),
            Rule::new(
                ErrorKind::DependencyNotFound,
                r#"(?:Couldn't find package "([^"]+)"|"https?://\S+/([^/"]+): Not found")"#,
                |caps| {
                    let package = caps.get(1).or_else(|| caps.get(2)).map_or("a dependency", |m| m.as_str());
                    format!(
                        "Couldn't find the package {package} in the registry. Please check the name in package.json, \
                         and that you have access to the registry if it is private."
                    )
                },
            ),
            node_network_rule(),
            node_permission_rule(),
            Rule::new(
                ErrorKind::MalformedManifest,
                r"(?:Unexpected token|Unexpected end of JSON input|Invalid package\.json)",
                |_| "package.json is not valid JSON. Please fix the syntax error reported above.".to_string(),
            ),
        ],
    )
});

pub static RECIPE: InstallRecipe = InstallRecipe {
    ecosystem: Ecosystem::Yarn,
    phase: PHASE_INSTALL,
    classifier: &CLASSIFIER,
    command,
    artifact: "yarn.lock",
};

fn command(base: &JobBase, ctx: &ToolContext) -> ToolCommand {
    ToolCommand::new(ctx.tool("yarn"))
        .args([
            "install",
            "--non-interactive",
            "--ignore-scripts",
            "--ignore-engines",
            "--ignore-platform",
            "--no-bin-links",
            "--production=false",
        ])
        .current_dir(base.dir())
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(InstallJob::new(file, &RECIPE, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::StatusSink;
    use crate::test_utils::MockRunner;

    #[tokio::test]
    async fn test_command_line() {
        let runner = MockRunner::new();
        let mut job = job(PathBuf::from("/p/web/package.json"), runner.context());
        job.run(&StatusSink::discard()).await;

        assert_eq!(
            runner.invocations(),
            vec![
                "yarn install --non-interactive --ignore-scripts --ignore-engines --ignore-platform --no-bin-links --production=false"
            ]
        );
    }

    #[tokio::test]
    async fn test_registry_unreachable() {
        let runner = MockRunner::new().fail(
            "yarn install",
            1,
            "info There appears to be trouble with your network connection. Retrying...\n\
             error An unexpected error occurred: \"https://registry.yarnpkg.com/react: getaddrinfo ENOTFOUND registry.yarnpkg.com\".",
        );
        let mut job = job(PathBuf::from("/p/package.json"), runner.context());
        job.run(&StatusSink::discard()).await;

        let errors = job.errors().criticals();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::RegistryUnreachable);
        assert!(errors[0].documentation().contains("network connection"));
        assert_eq!(errors[0].command(), Some(runner.invocations()[0].as_str()));
    }

    #[test]
    fn test_classification() {
        let (kind, doc) = CLASSIFIER.classify_text(
            "error Couldn't find any versions for \"left-pad\" that matches \"^99.0.0\"",
        );
        assert_eq!(kind, ErrorKind::VersionNotSatisfiable);
        assert!(doc.contains("^99.0.0"));

        let (kind, doc) = CLASSIFIER.classify_text(
            "error An unexpected error occurred: \"https://registry.yarnpkg.com/not-a-real-pkg: Not found\".",
        );
        assert_eq!(kind, ErrorKind::DependencyNotFound);
        assert!(doc.contains("not-a-real-pkg"));

        let (kind, _) = CLASSIFIER.classify_text("error An unexpected error occurred: \"EACCES: permission denied, mkdir '/p/node_modules'\".");
        assert_eq!(kind, ErrorKind::PermissionDenied);
    }
}
