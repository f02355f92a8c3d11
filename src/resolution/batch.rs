//! Grouping of candidate files into per-ecosystem batches.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::registry::{PackageManager, Registry};

/// Files claimed by one package manager.
#[derive(Debug, Clone)]
pub struct Batch {
    pm: PackageManager,
    files: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl Batch {
    pub fn new(pm: PackageManager) -> Self {
        Self {
            pm,
            files: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn package_manager(&self) -> &PackageManager {
        &self.pm
    }

    /// Files in first-seen order, without duplicates.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Add a file; a duplicate is ignored.
    pub fn add(&mut self, file: &Path) {
        if self.seen.insert(file.to_path_buf()) {
            self.files.push(file.to_path_buf());
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Turns a flat file list into batches.
#[derive(Debug, Clone)]
pub struct BatchFactory {
    registry: Registry,
}

impl BatchFactory {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Group `files` by the first package manager that claims each one.
    ///
    /// Batches follow registry order; unmatched files are dropped.
    pub fn make(&self, files: &[PathBuf]) -> Vec<Batch> {
        let pms = self.registry.package_managers();
        let mut slots: Vec<Option<Batch>> = vec![None; pms.len()];

        for file in files {
            let Some(name) = file.file_name().map(|n| n.to_string_lossy()) else {
                continue;
            };
            match pms.iter().position(|pm| pm.matches(&name)) {
                Some(index) => slots[index].get_or_insert_with(|| Batch::new(pms[index].clone())).add(file),
                None => tracing::trace!(target: "resolution", "No package manager for {}", file.display()),
            }
        }

        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory(prefer_npm: bool) -> BatchFactory {
        BatchFactory::new(Registry::builtin(prefer_npm).unwrap())
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_batches_follow_registry_order() {
        let files = paths(&["a/package.json", "b/go.mod", "c/pom.xml", "d/requirements.txt"]);
        let batches = factory(false).make(&files);
        let names: Vec<_> = batches.iter().map(|b| b.package_manager().name()).collect();
        assert_eq!(names, vec!["maven", "gomod", "pip", "yarn"]);
    }

    #[test]
    fn test_every_matched_file_in_exactly_one_batch() {
        let files = paths(&["a/package.json", "b/package.json", "c/build.gradle", "c/build.gradle.kts", "README.md"]);
        let batches = factory(false).make(&files);

        let total: usize = batches.iter().map(Batch::len).sum();
        assert_eq!(total, 4);
        for file in &files[..4] {
            let owners = batches.iter().filter(|b| b.files().contains(file)).count();
            assert_eq!(owners, 1, "{} owned {} times", file.display(), owners);
        }
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let files = paths(&["x/go.mod", "y/go.mod", "x/go.mod"]);
        let batches = factory(false).make(&files);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].files(), paths(&["x/go.mod", "y/go.mod"]).as_slice());
    }

    #[test]
    fn test_prefer_npm() {
        let files = paths(&["web/package.json"]);
        assert_eq!(factory(false).make(&files)[0].package_manager().name(), "yarn");
        assert_eq!(factory(true).make(&files)[0].package_manager().name(), "npm");
    }

    #[test]
    fn test_no_matches() {
        assert!(factory(false).make(&paths(&["notes.txt", "src/main.rs"])).is_empty());
        assert!(factory(false).make(&[]).is_empty());
    }
}
