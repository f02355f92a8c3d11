//! Platform-specific helpers.
//!
//! Tool layouts differ between Windows and Unix-like systems: virtual
//! environments keep executables in `Scripts\` instead of `bin/`, and the
//! Gradle wrapper is a `.bat` file.

use std::path::{Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Path of an executable inside a Python virtual environment.
pub fn venv_executable(venv: &Path, name: &str) -> PathBuf {
    if is_windows() {
        venv.join("Scripts").join(format!("{name}.exe"))
    } else {
        venv.join("bin").join(name)
    }
}

/// File name of the Gradle wrapper script.
pub const fn gradle_wrapper_name() -> &'static str {
    if is_windows() { "gradlew.bat" } else { "gradlew" }
}

/// Checks if a command is available in the system PATH.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}
