//! Shared helpers for the integration suite.

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project directory with a private tool directory next to it.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    tools_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        // Canonical so paths compare equal to what discovery reports
        let root = fs::canonicalize(temp_dir.path())?;
        let project_dir = root.join("project");
        let tools_dir = root.join("tools");
        fs::create_dir_all(&project_dir)?;
        fs::create_dir_all(&tools_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
            tools_dir,
        })
    }

    pub fn path(&self) -> &Path {
        &self.project_dir
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write(&self, rel: &str, content: &str) -> Result<PathBuf> {
        let path = self.project_dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Write `lockforge.toml` outside the project and return its path.
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        let path = self.tools_dir.join("lockforge.toml");
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Install an executable shell script standing in for a real tool.
    #[cfg(unix)]
    pub fn fake_tool(&self, name: &str, body: &str) -> Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let path = self.tools_dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    /// The lockforge binary, run from the project root with progress and
    /// colors disabled.
    pub fn lockforge(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(env!("CARGO_BIN_EXE_lockforge"));
        cmd.current_dir(&self.project_dir)
            .env("LOCKFORGE_NO_PROGRESS", "1")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("LOCKFORGE_WORKERS");
        cmd
    }
}

/// File assertion helpers
pub struct FileAssert;

impl FileAssert {
    pub fn exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    pub fn not_exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(!path.exists(), "Expected file to not exist: {}", path.display());
    }

    pub fn contains(path: impl AsRef<Path>, expected: &str) {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
        assert!(
            content.contains(expected),
            "Expected file {} to contain '{}'\nActual content: {}",
            path.display(),
            expected,
            content
        );
    }
}
