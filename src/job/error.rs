//! Per-job error records.
//!
//! A job never returns an error from `run`; it records [`JobError`]s into its
//! [`JobErrors`] collector instead. Critical entries mean no usable artifact
//! was produced. Warnings record a deviation, such as an automatic fallback,
//! on an otherwise successful run.

use serde::Serialize;
use std::fmt;

/// Closed set of diagnosis categories a tool failure is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The ecosystem's tool is not installed or not on PATH
    ExecutableNotFound,
    /// A declared dependency does not exist in the registry
    DependencyNotFound,
    /// No version satisfies the declared constraints
    VersionNotSatisfiable,
    /// The registry or network could not be reached
    RegistryUnreachable,
    /// The tool could not read, write or execute a path
    PermissionDenied,
    /// The manifest itself could not be parsed
    MalformedManifest,
    /// The tool failed for a reason of its own
    ToolInternalFailure,
    /// No classification rule matched
    Unclassified,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExecutableNotFound => "executable not found",
            Self::DependencyNotFound => "dependency not found",
            Self::VersionNotSatisfiable => "version not satisfiable",
            Self::RegistryUnreachable => "registry unreachable",
            Self::PermissionDenied => "permission denied",
            Self::MalformedManifest => "malformed manifest",
            Self::ToolInternalFailure => "tool failure",
            Self::Unclassified => "unclassified",
        };
        f.write_str(label)
    }
}

/// Whether an error prevented the artifact from being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The job produced its artifact despite this problem
    Warning,
    /// The job did not produce a usable artifact
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

/// One problem recorded by a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobError {
    message: String,
    command: Option<String>,
    documentation: String,
    status: String,
    severity: Severity,
    kind: ErrorKind,
}

impl JobError {
    /// Create a critical, unclassified error with the given message.
    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            command: None,
            documentation: String::new(),
            status: String::new(),
            severity: Severity::Critical,
            kind: ErrorKind::Unclassified,
        }
    }

    /// Create a warning with the given message.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::critical(message)
        }
    }

    /// Attach the command line that was executed.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attach the phase the job was in.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Attach a diagnosis and its remediation text.
    pub fn with_documentation(mut self, kind: ErrorKind, documentation: impl Into<String>) -> Self {
        self.kind = kind;
        self.documentation = documentation.into();
        self
    }

    /// Raw failure text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Exact command line, when the failure came from a subprocess.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Human-readable remediation text.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// Phase label at the time of failure.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

/// Collector of a single job's warnings and critical errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobErrors {
    warnings: Vec<JobError>,
    criticals: Vec<JobError>,
}

impl JobErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error in the bucket matching its severity.
    pub fn append(&mut self, error: JobError) {
        match error.severity() {
            Severity::Warning => self.warnings.push(error),
            Severity::Critical => self.criticals.push(error),
        }
    }

    /// True when anything at all was recorded.
    pub fn has_error(&self) -> bool {
        !self.warnings.is_empty() || !self.criticals.is_empty()
    }

    /// True when the job failed to produce its artifact.
    pub fn has_critical(&self) -> bool {
        !self.criticals.is_empty()
    }

    pub fn warnings(&self) -> &[JobError] {
        &self.warnings
    }

    pub fn criticals(&self) -> &[JobError] {
        &self.criticals
    }

    /// Criticals first, then warnings.
    pub fn all(&self) -> impl Iterator<Item = &JobError> {
        self.criticals.iter().chain(self.warnings.iter())
    }

    pub fn len(&self) -> usize {
        self.warnings.len() + self.criticals.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_error()
    }
}
