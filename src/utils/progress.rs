//! Progress indicators for resolve runs.
//!
//! The scheduler shows one spinner per running job inside a
//! [`MultiProgress`] container. Each spinner shows the manifest and the job's
//! current phase, and is finished with a check mark or a cross.
//!
//! Progress output is disabled when the config says so (`progress = false`,
//! `--no-progress`, or `LOCKFORGE_NO_PROGRESS`); every operation on a hidden
//! bar is a no-op, so callers never branch on it.
//!
//! ```rust
//! use lockforge::utils::progress::MultiProgress;
//!
//! let multi = MultiProgress::new(false);
//! let spinner = multi.add_spinner();
//! spinner.set_prefix("package.json");
//! spinner.set_message("installing dependencies");
//! spinner.finish_with_message("✓ done");
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressDrawTarget, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// A spinner or bar with lockforge styling.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a spinner for indeterminate progress.
    ///
    /// The spinner uses Unicode Braille patterns and ticks every 100ms.
    pub fn new_spinner() -> Self {
        let bar = IndicatifBar::new_spinner();
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            inner: bar,
        }
    }

    /// Creates a bar that ignores every operation.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{spinner:.cyan} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "•"])
}

/// A container for the spinners of concurrently running jobs.
pub struct MultiProgress {
    inner: indicatif::MultiProgress,
    enabled: bool,
}

impl MultiProgress {
    /// Creates a container; when `enabled` is false every spinner is hidden.
    pub fn new(enabled: bool) -> Self {
        let inner = indicatif::MultiProgress::new();
        if !enabled {
            inner.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self {
            inner,
            enabled,
        }
    }

    /// Creates and adds a new spinner.
    pub fn add_spinner(&self) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        ProgressBar {
            inner: self.inner.add(pb.inner),
        }
    }
}
