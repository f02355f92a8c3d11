//! The `resolve` command.
//!
//! Loads configuration, applies the command-line overrides, discovers
//! manifests under the given paths and runs them through the [`Resolver`].
//! The report goes to stdout; spinners and logs go to stderr, so
//! `--format json` output can be piped.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::ResolveConfig;
use crate::constants::MIN_WORKERS;
use crate::job::SystemRunner;
use crate::resolution::report::{render_json, render_text};
use crate::resolution::{Discovery, Registry, Resolver};

/// How the resolution report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary with classified errors
    Text,
    /// Machine-readable summary of every job
    Json,
}

/// Discover manifests and generate their lock artifacts.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Files or directories to resolve
    #[arg(value_name = "PATHS", default_value = ".")]
    paths: Vec<PathBuf>,

    /// Maximum number of manifests resolved at once
    #[arg(short, long, value_parser = parse_workers)]
    workers: Option<usize>,

    /// Resolve package.json with npm instead of yarn
    #[arg(long)]
    prefer_npm: bool,

    /// Resolve manifests that already have a lock file next to them
    #[arg(long)]
    regenerate: bool,

    /// Output format of the report
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Disable progress spinners
    #[arg(long)]
    no_progress: bool,
}

fn parse_workers(value: &str) -> Result<usize, String> {
    let workers: usize = value.parse().map_err(|_| format!("'{value}' is not a number"))?;
    if workers < MIN_WORKERS {
        return Err(format!("must be at least {MIN_WORKERS}"));
    }
    Ok(workers)
}

impl ResolveCommand {
    /// Command-line flags override file and environment settings.
    fn apply(&self, mut config: ResolveConfig) -> ResolveConfig {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.prefer_npm {
            config.prefer_npm = true;
        }
        if self.no_progress {
            config.progress = false;
        }
        config
    }

    pub async fn execute(self, config_path: Option<&Path>) -> Result<ExitCode> {
        let config = self.apply(ResolveConfig::load(config_path).await?);
        tracing::debug!("Effective configuration:\n{}", config.to_toml()?);

        let registry = Registry::from_config(&config)?;
        let discovery = Discovery::new(registry, &config.exclusions)?;
        let files = discovery.find(&self.paths, self.regenerate)?;
        tracing::info!("Found {} manifest(s) to resolve", files.len());

        let resolver = Resolver::from_config(config, Arc::new(SystemRunner))?;
        let resolution = resolver.resolve(&files, &self.paths).await.context("Resolution failed")?;

        match self.format {
            OutputFormat::Text => print!("{}", render_text(&resolution)),
            OutputFormat::Json => println!("{}", render_json(&resolution)?),
        }

        Ok(if resolution.has_critical() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
    }
}
