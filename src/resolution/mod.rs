//! The resolution engine.
//!
//! Candidate files flow through four stages:
//!
//! ```text
//! files -> BatchFactory -> batches -> StrategyFactory -> jobs -> Scheduler -> Resolution
//! ```
//!
//! - [`registry`] - which package manager claims which manifest
//! - [`batch`] - grouping files per package manager
//! - [`strategy`] - turning a batch into jobs
//! - [`scheduler`] - running jobs under a concurrency bound
//! - [`outcome`] - the aggregated [`Resolution`]
//! - [`discovery`] - finding manifests under scan roots
//! - [`report`] - rendering a resolution
//!
//! [`Resolver`] wires the stages together.

pub mod batch;
pub mod discovery;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod strategy;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub use batch::{Batch, BatchFactory};
pub use discovery::Discovery;
pub use outcome::Resolution;
pub use registry::{Ecosystem, PackageManager, Registry};
pub use scheduler::Scheduler;
pub use strategy::{PerFileStrategy, Strategy, StrategyFactory};

use crate::config::ResolveConfig;
use crate::job::{CommandRunner, Job, ToolContext};

/// Resolves manifest files into lock artifacts.
pub struct Resolver {
    batches: BatchFactory,
    strategies: StrategyFactory,
    scheduler: Scheduler,
}

impl Resolver {
    /// Build a resolver from explicit parts.
    pub fn new(registry: Registry, ctx: ToolContext) -> Self {
        let scheduler = Scheduler::new(ctx.config().workers, ctx.config().progress);
        Self {
            batches: BatchFactory::new(registry),
            strategies: StrategyFactory::new(ctx),
            scheduler,
        }
    }

    /// Build a resolver whose registry and scheduler follow `config`.
    pub fn from_config(config: ResolveConfig, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let registry = Registry::from_config(&config)?;
        Ok(Self::new(registry, ToolContext::new(runner, Arc::new(config))))
    }

    pub fn registry(&self) -> &Registry {
        self.batches.registry()
    }

    /// Resolve `files`. `paths` are the scan roots they were found under.
    pub async fn resolve(&self, files: &[PathBuf], paths: &[PathBuf]) -> Result<Resolution> {
        let mut jobs: Vec<Box<dyn Job>> = Vec::new();

        for batch in self.batches.make(files) {
            let name = batch.package_manager().name().to_string();
            let strategy = self.strategies.make(&batch, paths)?;
            let made = strategy.invoke().await.with_context(|| format!("Failed to prepare {name} jobs"))?;
            tracing::debug!(target: "resolution", "{}: {} file(s) -> {} job(s)", name, batch.len(), made.len());
            jobs.extend(made);
        }

        self.scheduler.schedule(jobs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::ErrorKind;
    use crate::test_utils::MockRunner;
    use std::path::Path;

    fn config() -> ResolveConfig {
        ResolveConfig {
            workers: 1,
            progress: false,
            ..ResolveConfig::default()
        }
    }

    #[tokio::test]
    async fn test_two_ecosystems_one_worker() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("web")).unwrap();
        let runner = MockRunner::new().writes("yarn install", "yarn.lock", "").writes("cargo", "Cargo.lock", "");
        let resolver = Resolver::from_config(config(), Arc::new(runner.clone())).unwrap();
        let files = vec![temp.path().join("web/package.json"), temp.path().join("Cargo.toml")];

        let resolution = resolver.resolve(&files, &[]).await.unwrap();
        assert_eq!(resolution.len(), 2);
        assert!(!resolution.has_err());
        assert_eq!(runner.invocations().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_tool_is_one_classified_error() {
        let runner = MockRunner::new().missing("yarn");
        let resolver = Resolver::from_config(config(), Arc::new(runner)).unwrap();
        let files = vec![PathBuf::from("/p/package.json")];

        let resolution = resolver.resolve(&files, &[]).await.unwrap();
        let job = resolution.job(Path::new("/p/package.json")).unwrap();
        let errors: Vec<_> = job.errors().all().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::ExecutableNotFound);
        assert!(errors[0].documentation().contains("Yarn"));
    }

    #[tokio::test]
    async fn test_unmatched_files_make_no_jobs() {
        let resolver = Resolver::from_config(config(), Arc::new(MockRunner::new())).unwrap();
        let resolution = resolver.resolve(&[PathBuf::from("notes.txt")], &[]).await.unwrap();
        assert!(resolution.is_empty());
    }

    #[tokio::test]
    async fn test_allow_list_limits_ecosystems() {
        let config = ResolveConfig {
            ecosystems: Some(vec!["cargo".to_string()]),
            ..config()
        };
        let resolver = Resolver::from_config(config, Arc::new(MockRunner::new())).unwrap();
        let files = vec![PathBuf::from("/p/package.json"), PathBuf::from("/p/Cargo.toml")];
        let resolution = resolver.resolve(&files, &[]).await.unwrap();
        assert_eq!(resolution.len(), 1);
        assert_eq!(resolution.jobs()[0].ecosystem(), Ecosystem::Cargo);
    }
}
