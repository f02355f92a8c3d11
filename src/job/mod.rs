//! Jobs: the unit of work that resolves one manifest into a lock artifact.
//!
//! A [`Job`] is built by an ecosystem strategy, run exactly once by the
//! [`Scheduler`](crate::resolution::scheduler::Scheduler), and afterwards
//! only inspected. While running it reports short phase labels through a
//! [`StatusSink`] and records failures into its [`JobErrors`]; `run` itself
//! never fails.
//!
//! # Lifecycle
//!
//! ```text
//! Pending -> Running{phase 1 -> ... -> phase n} -> Succeeded | Failed
//! ```
//!
//! The first unrecoverable tool failure records a critical error and skips
//! the remaining phases. A job with no critical error produced its artifact.
//!
//! # Status reporting
//!
//! The sink is created together with its receiver by whoever runs the job,
//! so a consumer exists before `run` starts. Sends never block.

pub mod classify;
pub mod command;
pub mod error;
pub mod install;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

pub use classify::{Classifier, Rule};
pub use command::{CommandOutput, CommandRunner, SystemRunner, ToolCommand, ToolError};
pub use error::{ErrorKind, JobError, JobErrors, Severity};

use crate::config::ResolveConfig;
use crate::resolution::registry::Ecosystem;
use crate::utils::fs::atomic_write;

/// Phase label used while a tool installs dependencies.
pub const PHASE_INSTALL: &str = "installing dependencies";
/// Phase label used while a tool builds the dependency graph.
pub const PHASE_GRAPH: &str = "creating dependency graph";
/// Phase label used while the artifact is persisted.
pub const PHASE_LOCK: &str = "creating lock file";

/// The contract every ecosystem job satisfies.
#[async_trait]
pub trait Job: Send + Sync {
    /// Manifest this job resolves; also its identity.
    fn file(&self) -> &Path;

    /// Ecosystem that produced the job.
    fn ecosystem(&self) -> Ecosystem;

    /// Everything recorded so far.
    fn errors(&self) -> &JobErrors;

    /// Run every phase, narrating progress on `status`.
    async fn run(&mut self, status: &StatusSink);
}

/// Sending half of a job's status stream.
#[derive(Debug, Clone)]
pub struct StatusSink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl StatusSink {
    /// Create a sink together with the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(tx),
            },
            rx,
        )
    }

    /// A sink whose messages go nowhere.
    pub fn discard() -> Self {
        Self {
            tx: None,
        }
    }

    /// Report a phase label. A closed receiver is ignored.
    pub fn send(&self, phase: &str) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(phase.to_string());
        }
    }
}

/// Shared, read-only context handed to strategies and jobs.
#[derive(Clone)]
pub struct ToolContext {
    runner: Arc<dyn CommandRunner>,
    config: Arc<ResolveConfig>,
}

impl ToolContext {
    pub fn new(runner: Arc<dyn CommandRunner>, config: Arc<ResolveConfig>) -> Self {
        Self {
            runner,
            config,
        }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Executable for `tool`, honouring `[tools]` overrides.
    pub fn tool(&self, tool: &str) -> String {
        self.config.tools.get(tool).cloned().unwrap_or_else(|| tool.to_string())
    }
}

/// State shared by every job implementation.
#[derive(Debug)]
pub struct JobBase {
    file: PathBuf,
    /// `file` made absolute; tools running in `dir()` are given this
    location: PathBuf,
    errors: JobErrors,
    phase: String,
}

impl JobBase {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let location = std::path::absolute(&file).unwrap_or_else(|_| file.clone());
        Self {
            file,
            location,
            errors: JobErrors::new(),
            phase: String::new(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Absolute path of the manifest.
    pub fn path(&self) -> &Path {
        &self.location
    }

    /// Absolute directory containing the manifest.
    pub fn dir(&self) -> &Path {
        match self.location.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// File name of the manifest.
    pub fn file_name(&self) -> String {
        self.file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
    }

    pub fn errors(&self) -> &JobErrors {
        &self.errors
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// Move to the next phase and report it.
    pub fn enter(&mut self, status: &StatusSink, phase: &str) {
        tracing::debug!(target: "resolution", "{}: {}", self.file.display(), phase);
        phase.clone_into(&mut self.phase);
        status.send(phase);
    }

    /// Record an error, stamping the current phase if it has none.
    pub fn record(&mut self, error: JobError) {
        let error = if error.status().is_empty() {
            let phase = self.phase.clone();
            error.with_status(phase)
        } else {
            error
        };
        self.errors.append(error);
    }

    /// Turn a tool failure into a critical, classified error.
    pub fn record_failure(&mut self, command: &ToolCommand, failure: &ToolError, classifier: &Classifier) {
        self.record(classified_error(command, failure, classifier));
    }

    /// Run `command`; on failure record it and return `None`.
    pub async fn exec(
        &mut self,
        ctx: &ToolContext,
        command: ToolCommand,
        classifier: &Classifier,
    ) -> Option<CommandOutput> {
        let command = command.with_context(self.file.display().to_string());
        match ctx.runner().run(&command).await {
            Ok(output) => Some(output),
            Err(failure) => {
                self.record_failure(&command, &failure, classifier);
                None
            }
        }
    }

    /// Check that a tool which exited cleanly left `artifact` behind; if not
    /// record a critical error.
    pub fn confirm_artifact(&mut self, artifact: &Path, command: Option<String>) -> bool {
        if artifact.is_file() {
            return true;
        }
        tracing::debug!(target: "resolution", "{}: {} is missing", self.file.display(), artifact.display());
        let error = JobError::critical(format!("{} was not written", artifact.display()));
        let error = match command {
            Some(command) => error.with_command(command),
            None => error,
        };
        self.record(error.with_documentation(
            ErrorKind::ToolInternalFailure,
            format!(
                "The tool finished without an error but didn't write {}. Run the command by hand to see what it \
                 produced.",
                artifact.display()
            ),
        ));
        false
    }

    /// Persist an artifact atomically; on failure record a critical error.
    pub fn write_artifact(&mut self, path: &Path, content: &str) -> bool {
        match atomic_write(path, content.as_bytes()) {
            Ok(()) => true,
            Err(error) => {
                self.record(JobError::critical(format!("{error:#}")).with_documentation(
                    ErrorKind::PermissionDenied,
                    format!(
                        "Couldn't write the lock file {}. Make sure the directory is writable and the disk is not full.",
                        path.display()
                    ),
                ));
                false
            }
        }
    }
}

/// Build the critical error for a tool failure.
pub fn classified_error(command: &ToolCommand, failure: &ToolError, classifier: &Classifier) -> JobError {
    let (kind, documentation) = classifier.classify(failure);
    let message = match failure {
        ToolError::Failed {
            ..
        } => failure.output_text(),
        _ => failure.to_string(),
    };
    JobError::critical(message).with_command(command.command_line()).with_documentation(kind, documentation)
}
