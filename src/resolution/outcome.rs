//! The aggregate result of one resolve run.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::registry::Ecosystem;
use crate::job::{ErrorKind, Job, JobError, Severity};

/// Every job of a run, in manifest-path order, after it ran.
#[derive(Default)]
pub struct Resolution {
    jobs: Vec<Box<dyn Job>>,
}

impl Resolution {
    /// Wraps finished jobs, sorting them by manifest path.
    pub fn new(mut jobs: Vec<Box<dyn Job>>) -> Self {
        jobs.sort_by(|a, b| a.file().cmp(b.file()));
        Self {
            jobs,
        }
    }

    pub fn jobs(&self) -> &[Box<dyn Job>] {
        &self.jobs
    }

    /// True iff any job recorded a warning or a critical error.
    pub fn has_err(&self) -> bool {
        self.jobs.iter().any(|job| job.errors().has_error())
    }

    /// True iff any job recorded a critical error.
    pub fn has_critical(&self) -> bool {
        self.jobs.iter().any(|job| job.errors().has_critical())
    }

    /// The job resolving `file`, if any.
    pub fn job(&self, file: &Path) -> Option<&dyn Job> {
        self.jobs.iter().find(|job| job.file() == file).map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs with at least one critical error.
    pub fn failed(&self) -> usize {
        self.jobs.iter().filter(|job| job.errors().has_critical()).count()
    }

    /// Jobs that succeeded with warnings.
    pub fn warned(&self) -> usize {
        self.jobs.iter().filter(|job| !job.errors().has_critical() && job.errors().has_error()).count()
    }

    /// Serializable view for reports.
    pub fn summary(&self) -> Summary {
        Summary {
            total: self.len(),
            failed: self.failed(),
            warned: self.warned(),
            jobs: self.jobs.iter().map(|job| JobSummary::from_job(job.as_ref())).collect(),
        }
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution").field("jobs", &self.jobs.iter().map(|j| j.file()).collect::<Vec<_>>()).finish()
    }
}

/// Report view of a [`Resolution`].
#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub failed: usize,
    pub warned: usize,
    pub jobs: Vec<JobSummary>,
}

/// Report view of one job.
#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub file: PathBuf,
    pub ecosystem: Ecosystem,
    pub succeeded: bool,
    pub errors: Vec<ErrorSummary>,
}

impl JobSummary {
    fn from_job(job: &dyn Job) -> Self {
        Self {
            file: job.file().to_path_buf(),
            ecosystem: job.ecosystem(),
            succeeded: !job.errors().has_critical(),
            errors: job.errors().all().map(ErrorSummary::from).collect(),
        }
    }
}

/// Report view of one error.
#[derive(Debug, Serialize)]
pub struct ErrorSummary {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub message: String,
    pub documentation: String,
}

impl From<&JobError> for ErrorSummary {
    fn from(error: &JobError) -> Self {
        Self {
            severity: error.severity(),
            kind: error.kind(),
            status: error.status().to_string(),
            command: error.command().map(ToString::to_string),
            message: error.message().to_string(),
            documentation: error.documentation().to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::job::{JobErrors, StatusSink};
    use async_trait::async_trait;

    /// A job with canned errors.
    pub(crate) struct StubJob {
        pub file: PathBuf,
        pub ecosystem: Ecosystem,
        pub errors: JobErrors,
    }

    impl StubJob {
        pub(crate) fn boxed(file: &str, errors: Vec<JobError>) -> Box<dyn Job> {
            let mut all = JobErrors::new();
            for error in errors {
                all.append(error);
            }
            Box::new(Self {
                file: PathBuf::from(file),
                ecosystem: Ecosystem::Gomod,
                errors: all,
            })
        }
    }

    #[async_trait]
    impl Job for StubJob {
        fn file(&self) -> &Path {
            &self.file
        }

        fn ecosystem(&self) -> Ecosystem {
            self.ecosystem
        }

        fn errors(&self) -> &JobErrors {
            &self.errors
        }

        async fn run(&mut self, _status: &StatusSink) {}
    }

    #[test]
    fn test_has_err_counts_warnings() {
        let clean = Resolution::new(vec![StubJob::boxed("a/go.mod", vec![])]);
        assert!(!clean.has_err());

        let warned = Resolution::new(vec![
            StubJob::boxed("a/go.mod", vec![]),
            StubJob::boxed("b/go.mod", vec![JobError::warning("used global gradle")]),
        ]);
        assert!(warned.has_err());
        assert!(!warned.has_critical());
        assert_eq!(warned.warned(), 1);
        assert_eq!(warned.failed(), 0);
    }

    #[test]
    fn test_jobs_sorted_by_path() {
        let resolution = Resolution::new(vec![
            StubJob::boxed("z/go.mod", vec![]),
            StubJob::boxed("a/go.mod", vec![JobError::critical("boom")]),
        ]);
        let files: Vec<_> = resolution.jobs().iter().map(|j| j.file().to_path_buf()).collect();
        assert_eq!(files, vec![PathBuf::from("a/go.mod"), PathBuf::from("z/go.mod")]);
        assert!(resolution.job(Path::new("a/go.mod")).unwrap().errors().has_critical());
        assert_eq!(resolution.failed(), 1);
    }

    #[test]
    fn test_summary_serializes() {
        let resolution = Resolution::new(vec![StubJob::boxed(
            "go.mod",
            vec![JobError::critical("boom").with_command("go mod graph")],
        )]);
        let json = serde_json::to_value(resolution.summary()).unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["jobs"][0]["ecosystem"], "gomod");
        assert_eq!(json["jobs"][0]["succeeded"], false);
        assert_eq!(json["jobs"][0]["errors"][0]["command"], "go mod graph");
        assert_eq!(json["jobs"][0]["errors"][0]["severity"], "critical");
    }
}
