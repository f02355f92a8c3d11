//! Cross-platform utilities and helpers
//!
//! - [`fs`] - atomic writes and scoped temporary files
//! - [`platform`] - platform-specific tool layouts
//! - [`progress`] - spinners for running jobs

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{RemoveOnDrop, atomic_write, ensure_dir};
pub use platform::{command_exists, is_windows};
pub use progress::{MultiProgress, ProgressBar};
