//! Configuration for a resolve run.
//!
//! lockforge reads a single TOML file, applies environment overrides, and
//! then CLI flags. The resulting [`ResolveConfig`] is immutable for the rest
//! of the run and handed explicitly to the components that need it.
//!
//! # Lookup order
//!
//! 1. `--config <path>` (must exist)
//! 2. `./lockforge.toml`
//! 3. `<config dir>/lockforge/config.toml` (e.g. `~/.config/lockforge/config.toml`)
//! 4. built-in defaults
//!
//! # Example
//!
//! ```toml
//! workers = 4
//! prefer_npm = true
//! python = "python3.12"
//! ecosystems = ["npm", "pip", "gradle"]
//! exclusions = ["**/node_modules/**", "**/fixtures/**"]
//!
//! [tools]
//! mvn = "/opt/maven/bin/mvn"
//! gradle = "/opt/gradle/bin/gradle"
//! ```
//!
//! # Environment
//!
//! - `LOCKFORGE_WORKERS` - overrides `workers`
//! - `LOCKFORGE_NO_PROGRESS` - disables progress output when set

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{MIN_WORKERS, NO_PROGRESS_ENV, PROJECT_CONFIG_FILE, WORKERS_ENV, default_workers};
use crate::core::LockforgeError;

/// Settings for one resolve run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    /// Maximum number of jobs running at once.
    pub workers: usize,

    /// Let npm claim `package.json` instead of yarn.
    pub prefer_npm: bool,

    /// Show per-job progress spinners.
    pub progress: bool,

    /// Python interpreter used to create pip environments.
    pub python: String,

    /// Restrict resolution to these ecosystems, in registry order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecosystems: Option<Vec<String>>,

    /// Glob patterns excluded from discovery.
    pub exclusions: Vec<String>,

    /// Executable overrides keyed by tool name (`npm`, `mvn`, `gradle`, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            prefer_npm: false,
            progress: true,
            python: default_python().to_string(),
            ecosystems: None,
            exclusions: default_exclusions(),
            tools: BTreeMap::new(),
        }
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Directories that never contain first-party manifests.
pub fn default_exclusions() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/vendor/**",
        "**/.git/**",
        "**/bower_components/**",
        "**/obj/**",
        "**/target/**",
        "**/.venv/**",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl ResolveConfig {
    /// Load configuration following the lookup order, then apply env overrides.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load_from(path).await?,
            None => match Self::find_default() {
                Some(path) => Self::load_from(&path).await?,
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse a configuration file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| LockforgeError::ConfigError {
            path: path.display().to_string(),
            reason: e.message().to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn find_default() -> Option<PathBuf> {
        let local = PathBuf::from(PROJECT_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir().map(|dir| dir.join("lockforge").join("config.toml")).filter(|p| p.is_file())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.workers < MIN_WORKERS {
            return Err(LockforgeError::ConfigError {
                path: path.display().to_string(),
                reason: format!("workers must be at least {MIN_WORKERS}"),
            }
            .into());
        }
        Ok(())
    }

    /// Apply environment overrides; `lookup` abstracts `std::env::var`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(workers) = lookup(WORKERS_ENV) {
            match workers.trim().parse::<usize>() {
                Ok(n) if n >= MIN_WORKERS => self.workers = n,
                _ => tracing::warn!("Ignoring invalid {}={}", WORKERS_ENV, workers),
            }
        }
        if lookup(NO_PROGRESS_ENV).is_some() {
            self.progress = false;
        }
        self
    }

    /// Serialize for `--print-config` style inspection and tests.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
