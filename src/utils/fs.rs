//! File system helpers.
//!
//! Lock artifacts are written with [`atomic_write`] so that an interrupted
//! run never leaves a half-written artifact that discovery would mistake for
//! a resolved manifest.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Ensures a directory exists, creating it and its parents if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Writes `content` to `path` via a sibling temp file and a rename.
///
/// Readers either see the previous file or the complete new one.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let temp_path = temp_sibling(path);

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename temp file to: {}", path.display())
    })?;

    Ok(())
}

// `with_extension` would clobber names like `.requirements.txt.pip.debricked.lock`
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Removes a file when dropped.
///
/// Used for files lockforge creates next to a manifest only for the
/// duration of one job (converted projects, multi-module markers).
#[derive(Debug)]
pub struct RemoveOnDrop {
    path: PathBuf,
}

impl RemoveOnDrop {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!("Removed temporary file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
