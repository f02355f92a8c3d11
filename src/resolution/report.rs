//! Rendering a [`Resolution`] for humans and machines.

use anyhow::Result;
use colored::Colorize;
use std::fmt::Write;

use super::outcome::Resolution;
use crate::job::Severity;

/// Plain-text report. Lists every job that recorded errors, then a summary.
pub fn render_text(resolution: &Resolution) -> String {
    let mut out = String::new();

    if !resolution.has_err() {
        let _ = writeln!(out, "{} Resolved {} manifest(s)", "✓".green(), resolution.len());
        return out;
    }

    for job in resolution.jobs().iter().filter(|job| job.errors().has_error()) {
        let _ = writeln!(out, "{} ({})", job.file().display().to_string().bold(), job.ecosystem());
        for error in job.errors().all() {
            let label = match error.severity() {
                Severity::Critical => "critical".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            let _ = writeln!(out, "  {label} [{}] {}", error.kind(), error.status());
            if let Some(command) = error.command() {
                let _ = writeln!(out, "    command: {}", command.dimmed());
            }
            for line in error.message().lines().filter(|l| !l.trim().is_empty()) {
                let _ = writeln!(out, "    | {line}");
            }
            let _ = writeln!(out, "    {}", error.documentation().cyan());
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{} of {} manifests failed, {} with warnings",
        resolution.failed(),
        resolution.len(),
        resolution.warned()
    );
    out
}

/// JSON report of the resolution summary.
pub fn render_json(resolution: &Resolution) -> Result<String> {
    Ok(serde_json::to_string_pretty(&resolution.summary())?)
}
