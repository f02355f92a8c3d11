//! Command-line interface for lockforge.
//!
//! # Commands
//!
//! - `resolve` - discover manifests and generate their lock artifacts
//! - `ecosystems` - list the package managers in registry order
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - no logging at all
//! - `--config <path>` - use this configuration file instead of the lookup order
//!
//! `RUST_LOG` always wins over `--verbose` and `--quiet`.
//!
//! # Examples
//!
//! ```bash
//! lockforge resolve
//! lockforge resolve services/ web/package.json --workers 2
//! lockforge resolve --prefer-npm --format json > resolution.json
//! lockforge --verbose resolve --regenerate
//! lockforge ecosystems
//! ```

mod ecosystems;
mod resolve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

pub use ecosystems::EcosystemsCommand;
pub use resolve::{OutputFormat, ResolveCommand};

/// Resolve dependency manifests into lock files.
#[derive(Parser, Debug)]
#[command(
    name = "lockforge",
    about = "Resolve dependency manifests into lock files",
    version,
    long_about = "lockforge finds the dependency manifests of a project and runs each \
                  ecosystem's own tooling to produce lock files for dependency scanning."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    ///
    /// Shows every command lockforge runs and how each failure was classified.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output
    ///
    /// The report itself is still printed.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a configuration file
    ///
    /// Replaces the default lookup of `./lockforge.toml` and the user config
    /// directory. The file must exist.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover manifests and generate their lock artifacts.
    ///
    /// Exits with status 1 when any manifest failed to resolve.
    Resolve(ResolveCommand),

    /// List supported package managers in registry order.
    Ecosystems(EcosystemsCommand),
}

impl Cli {
    /// Log filter directive selected by the global flags, `None` to disable logging.
    #[must_use]
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            None
        } else {
            Some("warn")
        }
    }

    /// Install the global `tracing` subscriber. `RUST_LOG` takes precedence
    /// over the verbosity flags.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            match self.log_level() {
                Some(level) => EnvFilter::new(level),
                None => return,
            }
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.verbose)
            .try_init();
    }

    /// Run the selected command and return the process exit code.
    pub async fn execute(self) -> Result<ExitCode> {
        match self.command {
            Commands::Resolve(cmd) => cmd.execute(self.config.as_deref()).await,
            Commands::Ecosystems(cmd) => cmd.execute(self.config.as_deref()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        assert!(Cli::try_parse_from(["lockforge", "--help"]).is_err());
        assert!(Cli::try_parse_from(["lockforge", "resolve"]).is_ok());
        assert!(Cli::try_parse_from(["lockforge", "ecosystems"]).is_ok());
        assert!(Cli::try_parse_from(["lockforge"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["lockforge", "-v", "-q", "resolve"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let cli = Cli::try_parse_from(["lockforge", "--verbose", "resolve"]).unwrap();
        assert_eq!(cli.log_level(), Some("debug"));

        let cli = Cli::try_parse_from(["lockforge", "resolve", "--quiet"]).unwrap();
        assert_eq!(cli.log_level(), None);

        let cli = Cli::try_parse_from(["lockforge", "resolve"]).unwrap();
        assert_eq!(cli.log_level(), Some("warn"));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["lockforge", "ecosystems", "--config", "ci/lockforge.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci/lockforge.toml")));
    }
}
