//! Manifest discovery.
//!
//! Walks scan roots and returns the manifests the registry recognises,
//! skipping excluded directories and manifests that already have a lock
//! artifact next to them. A scan root that is a file is taken as-is.

use anyhow::{Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

use super::registry::{Ecosystem, Registry};
use crate::core::LockforgeError;

/// Finds unresolved manifests under scan roots.
#[derive(Debug, Clone)]
pub struct Discovery {
    registry: Registry,
    exclusions: Vec<Pattern>,
}

impl Discovery {
    /// Compile the exclusion globs.
    pub fn new(registry: Registry, exclusions: &[String]) -> Result<Self, LockforgeError> {
        let exclusions = exclusions
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| LockforgeError::InvalidExclusion {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            registry,
            exclusions,
        })
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclusions.iter().any(|p| p.matches_path(path))
    }

    // A directory is pruned when anything inside it would be excluded
    fn is_excluded_dir(&self, dir: &Path) -> bool {
        let sentinel = dir.join("_");
        self.exclusions.iter().any(|p| p.matches_path(&sentinel))
    }

    /// Manifests under `paths`, sorted and deduplicated.
    ///
    /// With `regenerate` unset, manifests whose lock artifact exists are left out.
    pub fn find(&self, paths: &[PathBuf], regenerate: bool) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        for root in paths {
            if !root.exists() {
                return Err(LockforgeError::PathNotFound {
                    path: root.display().to_string(),
                }
                .into());
            }
            if root.is_file() {
                found.push(root.clone());
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !(e.file_type().is_dir() && e.depth() > 0 && self.is_excluded_dir(e.path())));
            for entry in walker {
                let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
                if entry.file_type().is_file() && !self.is_excluded(entry.path()) {
                    found.push(entry.into_path());
                }
            }
        }

        let mut manifests: Vec<PathBuf> =
            found.into_iter().filter(|file| self.is_candidate(file, regenerate)).collect();
        manifests.sort();
        manifests.dedup();
        tracing::debug!(target: "resolution", "Discovered {} manifest(s)", manifests.len());
        Ok(manifests)
    }

    fn is_candidate(&self, file: &Path, regenerate: bool) -> bool {
        let Some(pm) = self.registry.match_file(file) else {
            return false;
        };
        if regenerate {
            return true;
        }
        let Ok(ecosystem) = Ecosystem::from_str(pm.name()) else {
            return true;
        };
        match ecosystem.lock_files(file).into_iter().find(|lock| lock.exists()) {
            Some(lock) => {
                tracing::debug!(target: "resolution", "Skipping {}: {} exists", file.display(), lock.display());
                false
            }
            None => true,
        }
    }
}
