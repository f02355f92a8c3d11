//! Package-manager registry.
//!
//! The registry is an ordered list of [`PackageManager`] descriptors: a name
//! plus the regular expressions its manifest file names match. Order matters:
//! a file belongs to the first package manager with a matching pattern, which
//! is how `yarn` and `npm` share `package.json`.
//!
//! The twelve supported ecosystems form the closed [`Ecosystem`] enum. A
//! descriptor's name is only turned into an `Ecosystem` by the strategy
//! factory, so the registry itself stays plain data.

use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::ResolveConfig;
use crate::constants::{GRADLE_LOCK_FILE, LOCK_SUFFIX};
use crate::core::LockforgeError;

/// The supported package-manager ecosystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Maven,
    Gradle,
    Sbt,
    Gomod,
    Pip,
    Uv,
    Yarn,
    Npm,
    Bower,
    Nuget,
    Composer,
    Cargo,
}

impl Ecosystem {
    /// Every ecosystem in default registry order.
    pub const ALL: [Self; 12] = [
        Self::Maven,
        Self::Gradle,
        Self::Sbt,
        Self::Gomod,
        Self::Pip,
        Self::Uv,
        Self::Yarn,
        Self::Npm,
        Self::Bower,
        Self::Nuget,
        Self::Composer,
        Self::Cargo,
    ];

    /// Registry name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Maven => "maven",
            Self::Gradle => "gradle",
            Self::Sbt => "sbt",
            Self::Gomod => "gomod",
            Self::Pip => "pip",
            Self::Uv => "uv",
            Self::Yarn => "yarn",
            Self::Npm => "npm",
            Self::Bower => "bower",
            Self::Nuget => "nuget",
            Self::Composer => "composer",
            Self::Cargo => "cargo",
        }
    }

    /// Default manifest patterns, matched against base names.
    pub const fn manifest_patterns(self) -> &'static [&'static str] {
        match self {
            Self::Maven => &[r"^pom\.xml$"],
            Self::Gradle => &[r"^build\.gradle(\.kts)?$"],
            Self::Sbt => &[r"^build\.sbt$"],
            Self::Gomod => &[r"^go\.mod$"],
            Self::Pip => &[r"^requirements.*\.txt$"],
            Self::Uv => &[r"^pyproject\.toml$"],
            Self::Yarn | Self::Npm => &[r"^package\.json$"],
            Self::Bower => &[r"^bower\.json$"],
            Self::Nuget => &[r"\.csproj$", r"^packages\.config$"],
            Self::Composer => &[r"^composer\.json$"],
            Self::Cargo => &[r"^Cargo\.toml$"],
        }
    }

    /// Primary executable the ecosystem drives.
    pub const fn tool(self) -> &'static str {
        match self {
            Self::Maven => "mvn",
            Self::Gradle => "gradle",
            Self::Sbt => "sbt",
            Self::Gomod => "go",
            Self::Pip => "python3",
            Self::Uv => "uv",
            Self::Yarn => "yarn",
            Self::Npm => "npm",
            Self::Bower => "bower",
            Self::Nuget => "dotnet",
            Self::Composer => "composer",
            Self::Cargo => "cargo",
        }
    }

    /// Files whose presence next to `manifest` means it is already resolved.
    pub fn lock_files(self, manifest: &Path) -> Vec<PathBuf> {
        let dir = manifest.parent().unwrap_or_else(|| Path::new(""));
        let name = manifest.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        match self {
            Self::Maven => vec![dir.join(format!("maven.{LOCK_SUFFIX}"))],
            Self::Gradle => vec![dir.join(GRADLE_LOCK_FILE)],
            Self::Sbt => vec![dir.join(format!("sbt.{LOCK_SUFFIX}"))],
            Self::Gomod => vec![dir.join(format!("gomod.{LOCK_SUFFIX}"))],
            Self::Pip => vec![dir.join(hidden_lock_name(&name, self))],
            Self::Uv => vec![dir.join("uv.lock")],
            Self::Yarn | Self::Npm => vec![dir.join("yarn.lock"), dir.join("package-lock.json")],
            Self::Bower => vec![dir.join(format!("bower.{LOCK_SUFFIX}"))],
            Self::Nuget if name == "packages.config" => vec![dir.join(hidden_lock_name(&name, self))],
            Self::Nuget => vec![dir.join("packages.lock.json")],
            Self::Composer => vec![dir.join("composer.lock")],
            Self::Cargo => vec![dir.join("Cargo.lock")],
        }
    }
}

/// `.<manifest>.<ecosystem>.debricked.lock`
pub fn hidden_lock_name(manifest_name: &str, ecosystem: Ecosystem) -> String {
    format!(".{manifest_name}.{}.{LOCK_SUFFIX}", ecosystem.name())
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ecosystem {
    type Err = LockforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|e| e.name() == s).ok_or_else(|| LockforgeError::UnknownStrategy {
            name: s.to_string(),
        })
    }
}

/// A registered package manager: name and manifest patterns.
#[derive(Debug, Clone)]
pub struct PackageManager {
    name: String,
    manifest_patterns: Vec<Regex>,
}

impl PackageManager {
    /// Build a descriptor from a name and pattern sources.
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Result<Self, LockforgeError> {
        let name = name.into();
        let manifest_patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| LockforgeError::InvalidPattern {
                    name: name.clone(),
                    pattern: (*p).to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name,
            manifest_patterns,
        })
    }

    /// Descriptor for a built-in ecosystem.
    pub fn for_ecosystem(ecosystem: Ecosystem) -> Result<Self, LockforgeError> {
        Self::new(ecosystem.name(), ecosystem.manifest_patterns())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest_patterns(&self) -> &[Regex] {
        &self.manifest_patterns
    }

    /// True if any pattern matches the base name.
    pub fn matches(&self, base_name: &str) -> bool {
        self.manifest_patterns.iter().any(|p| p.is_match(base_name))
    }
}

/// Ordered, immutable list of package managers.
#[derive(Debug, Clone)]
pub struct Registry {
    pms: Vec<PackageManager>,
}

impl Registry {
    /// Registry from explicit descriptors, in the given order.
    pub fn new(pms: Vec<PackageManager>) -> Self {
        Self {
            pms,
        }
    }

    /// Built-in registry in default order.
    pub fn builtin(prefer_npm: bool) -> Result<Self, LockforgeError> {
        Self::from_ecosystems(&ordered(prefer_npm))
    }

    /// Built-in registry shaped by configuration.
    pub fn from_config(config: &ResolveConfig) -> Result<Self> {
        let order = ordered(config.prefer_npm);
        let selected = match &config.ecosystems {
            None => order,
            Some(names) => {
                let wanted = names
                    .iter()
                    .map(|n| {
                        Ecosystem::from_str(n).map_err(|_| LockforgeError::UnknownEcosystem {
                            name: n.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                order.into_iter().filter(|e| wanted.contains(e)).collect()
            }
        };
        Ok(Self::from_ecosystems(&selected)?)
    }

    fn from_ecosystems(ecosystems: &[Ecosystem]) -> Result<Self, LockforgeError> {
        ecosystems.iter().map(|e| PackageManager::for_ecosystem(*e)).collect::<Result<Vec<_>, _>>().map(Self::new)
    }

    pub fn package_managers(&self) -> &[PackageManager] {
        &self.pms
    }

    /// First package manager whose patterns match the file's base name.
    pub fn match_file(&self, path: &Path) -> Option<&PackageManager> {
        let base = path.file_name()?.to_string_lossy();
        self.pms.iter().find(|pm| pm.matches(&base))
    }
}

fn ordered(prefer_npm: bool) -> Vec<Ecosystem> {
    let mut order = Ecosystem::ALL.to_vec();
    if prefer_npm {
        let yarn = order.iter().position(|e| *e == Ecosystem::Yarn);
        let npm = order.iter().position(|e| *e == Ecosystem::Npm);
        if let (Some(yarn), Some(npm)) = (yarn, npm) {
            order.swap(yarn, npm);
        }
    }
    order
}
