//! lockforge - resolve dependency manifests into lock files
//!
//! lockforge walks a project, recognizes the manifests of twelve package
//! ecosystems and drives each ecosystem's own tooling to produce a lock
//! artifact: the file a software-composition scanner needs to see the full,
//! pinned dependency graph.
//!
//! # Architecture Overview
//!
//! ```text
//! paths -> Discovery -> files -> BatchFactory -> batches
//!       -> StrategyFactory -> jobs -> Scheduler -> Resolution -> report
//! ```
//!
//! - A [`resolution::Registry`] lists the package managers and the manifest
//!   patterns they claim. The first match wins, so a file belongs to exactly
//!   one batch.
//! - A [`resolution::Strategy`] turns a batch into jobs: one per file for most
//!   ecosystems, one per module directory for Gradle.
//! - Every [`job::Job`] runs external commands through a
//!   [`job::CommandRunner`], classifies failures with per-ecosystem regex
//!   rules and records [`job::JobError`]s instead of aborting.
//! - The [`resolution::Scheduler`] runs jobs with at most `workers` in flight
//!   and returns the aggregated [`resolution::Resolution`].
//!
//! # Core Modules
//!
//! - [`cli`] - command-line interface
//! - [`config`] - `lockforge.toml` and environment overrides
//! - [`core`] - infrastructure errors and their user-facing display
//! - [`ecosystems`] - the twelve ecosystem protocols
//! - [`job`] - job contract, command execution and error classification
//! - [`resolution`] - registry, batching, strategies, scheduling, reporting
//! - [`utils`] - file system, platform and progress helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use lockforge::config::ResolveConfig;
//! use lockforge::job::SystemRunner;
//! use lockforge::resolution::{Discovery, Registry, Resolver};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ResolveConfig::default();
//! let paths = vec![PathBuf::from(".")];
//! let discovery = Discovery::new(Registry::from_config(&config)?, &config.exclusions)?;
//! let files = discovery.find(&paths, false)?;
//!
//! let resolver = Resolver::from_config(config, Arc::new(SystemRunner))?;
//! let resolution = resolver.resolve(&files, &paths).await?;
//! println!("{}", lockforge::resolution::report::render_text(&resolution));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod ecosystems;
pub mod job;
pub mod resolution;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
