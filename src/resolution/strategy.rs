//! Strategies turn a batch into jobs.
//!
//! Most ecosystems map one manifest to one job and share
//! [`PerFileStrategy`]. Gradle needs a setup phase that inspects the project
//! layout before it knows which jobs to create, which is why
//! [`Strategy::invoke`] is async.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::str::FromStr;

use super::batch::Batch;
use super::registry::Ecosystem;
use crate::core::LockforgeError;
use crate::ecosystems;
use crate::ecosystems::gradle::GradleStrategy;
use crate::job::{Job, ToolContext};

/// Builds the job for one manifest.
pub type JobBuilder = fn(PathBuf, ToolContext) -> Box<dyn Job>;

/// A single-use factory of jobs for one batch.
#[async_trait]
pub trait Strategy: Send {
    /// Produce the jobs; the strategy is consumed.
    async fn invoke(self: Box<Self>) -> Result<Vec<Box<dyn Job>>>;
}

/// One job per file.
pub struct PerFileStrategy {
    files: Vec<PathBuf>,
    ctx: ToolContext,
    build: JobBuilder,
}

impl PerFileStrategy {
    pub fn new(files: Vec<PathBuf>, ctx: ToolContext, build: JobBuilder) -> Self {
        Self {
            files,
            ctx,
            build,
        }
    }
}

#[async_trait]
impl Strategy for PerFileStrategy {
    async fn invoke(self: Box<Self>) -> Result<Vec<Box<dyn Job>>> {
        let Self {
            files,
            ctx,
            build,
        } = *self;
        Ok(files.into_iter().map(|file| build(file, ctx.clone())).collect())
    }
}

/// Dispatches a batch to its ecosystem's strategy.
pub struct StrategyFactory {
    ctx: ToolContext,
}

impl StrategyFactory {
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            ctx,
        }
    }

    /// Strategy for `batch`. `paths` are the scan roots the batch came from.
    pub fn make(&self, batch: &Batch, paths: &[PathBuf]) -> Result<Box<dyn Strategy>, LockforgeError> {
        let name = batch.package_manager().name();
        let ecosystem = Ecosystem::from_str(name)?;
        let files = batch.files().to_vec();
        let ctx = self.ctx.clone();

        let strategy: Box<dyn Strategy> = match ecosystem {
            Ecosystem::Gradle => Box::new(GradleStrategy::new(files, paths.to_vec(), ctx)),
            Ecosystem::Maven => Box::new(PerFileStrategy::new(files, ctx, ecosystems::maven::job)),
            Ecosystem::Sbt => Box::new(PerFileStrategy::new(files, ctx, ecosystems::sbt::job)),
            Ecosystem::Gomod => Box::new(PerFileStrategy::new(files, ctx, ecosystems::gomod::job)),
            Ecosystem::Pip => Box::new(PerFileStrategy::new(files, ctx, ecosystems::pip::job)),
            Ecosystem::Uv => Box::new(PerFileStrategy::new(files, ctx, ecosystems::uv::job)),
            Ecosystem::Yarn => Box::new(PerFileStrategy::new(files, ctx, ecosystems::yarn::job)),
            Ecosystem::Npm => Box::new(PerFileStrategy::new(files, ctx, ecosystems::npm::job)),
            Ecosystem::Bower => Box::new(PerFileStrategy::new(files, ctx, ecosystems::bower::job)),
            Ecosystem::Nuget => Box::new(PerFileStrategy::new(files, ctx, ecosystems::nuget::job)),
            Ecosystem::Composer => Box::new(PerFileStrategy::new(files, ctx, ecosystems::composer::job)),
            Ecosystem::Cargo => Box::new(PerFileStrategy::new(files, ctx, ecosystems::cargo::job)),
        };
        tracing::debug!(target: "resolution", "{} strategy for {} file(s)", ecosystem, batch.len());
        Ok(strategy)
    }
}
