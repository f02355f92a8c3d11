//! Bounded-concurrency execution of jobs.
//!
//! Jobs are spawned onto the runtime and driven through
//! `buffer_unordered(workers)`, so at most `workers` jobs run at any moment
//! and they run in parallel across runtime threads. Each job gets its own
//! status sink whose receiver is drained into a spinner by a companion task
//! started before the job runs.
//!
//! A job that records errors is a normal outcome. A job task that panics or
//! is cancelled is a scheduler failure and aborts `schedule` with an error.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;

use super::outcome::Resolution;
use crate::constants::MIN_WORKERS;
use crate::core::LockforgeError;
use crate::job::{Job, StatusSink};
use crate::utils::progress::{MultiProgress, ProgressBar};

/// Runs jobs with a fixed bound on concurrency.
pub struct Scheduler {
    workers: usize,
    progress: Arc<MultiProgress>,
}

impl Scheduler {
    /// A scheduler running at most `workers` jobs at once (minimum one).
    pub fn new(workers: usize, show_progress: bool) -> Self {
        Self {
            workers: workers.max(MIN_WORKERS),
            progress: Arc::new(MultiProgress::new(show_progress)),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job exactly once and aggregate the results.
    pub async fn schedule(&self, jobs: Vec<Box<dyn Job>>) -> Result<Resolution> {
        tracing::debug!(target: "resolution", "Scheduling {} job(s) on {} worker(s)", jobs.len(), self.workers);

        let results: Vec<(PathBuf, Result<Box<dyn Job>, tokio::task::JoinError>)> = stream::iter(jobs)
            .map(|job| {
                let file = job.file().to_path_buf();
                let spinner = self.progress.add_spinner();
                let handle = tokio::spawn(run_job(job, spinner));
                async move { (file, handle.await) }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut finished = Vec::with_capacity(results.len());
        for (file, result) in results {
            match result {
                Ok(job) => finished.push(job),
                Err(e) => {
                    return Err(LockforgeError::SchedulerFailure {
                        file: file.display().to_string(),
                        reason: if e.is_panic() { "job panicked".to_string() } else { e.to_string() },
                    }
                    .into());
                }
            }
        }

        Ok(Resolution::new(finished))
    }
}

async fn run_job(mut job: Box<dyn Job>, spinner: ProgressBar) -> Box<dyn Job> {
    spinner.set_prefix(job.file().display().to_string());

    let (sink, mut rx) = StatusSink::channel();
    let drain_spinner = spinner.clone();
    let drain = tokio::spawn(async move {
        while let Some(phase) = rx.recv().await {
            drain_spinner.set_message(phase);
        }
    });

    job.run(&sink).await;
    drop(sink);
    let _ = drain.await;

    let errors = job.errors();
    if errors.has_critical() {
        tracing::debug!(target: "resolution", "{} failed with {} error(s)", job.file().display(), errors.len());
        spinner.finish_with_message("✗ failed");
    } else if errors.has_error() {
        spinner.finish_with_message("✓ done with warnings");
    } else {
        spinner.finish_with_message("✓ done");
    }
    job
}
