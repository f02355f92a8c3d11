use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::setup::Module;
use super::{InitScript, dependencies_task, run_gradle};
use crate::constants::GRADLE_LOCK_FILE;
use crate::job::{Job, JobBase, JobError, JobErrors, PHASE_GRAPH, StatusSink, ToolContext};
use crate::resolution::registry::Ecosystem;

/// Dumps the dependency graph of one Gradle module.
pub struct GradleJob {
    base: JobBase,
    module: Module,
    script: Arc<InitScript>,
    ctx: ToolContext,
}

impl GradleJob {
    pub fn new(file: impl Into<PathBuf>, module: Module, script: Arc<InitScript>, ctx: ToolContext) -> Self {
        Self {
            base: JobBase::new(file),
            module,
            script,
            ctx,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Attach an error found while inspecting the build. A critical one
    /// means the job will not run.
    pub fn record_setup(&mut self, error: JobError) {
        let error = if error.status().is_empty() { error.with_status("inspecting gradle build") } else { error };
        self.base.record(error);
    }
}

#[async_trait]
impl Job for GradleJob {
    fn file(&self) -> &Path {
        self.base.file()
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Gradle
    }

    fn errors(&self) -> &JobErrors {
        self.base.errors()
    }

    async fn run(&mut self, status: &StatusSink) {
        if self.base.errors().has_critical() {
            return;
        }

        self.base.enter(status, PHASE_GRAPH);
        let task = dependencies_task(&self.module.path);
        let context = self.base.file().display().to_string();
        match run_gradle(&self.ctx, &self.module.project, self.script.path(), &task, &context).await {
            Ok((_, warning)) => {
                if let Some(warning) = warning {
                    self.base.record(warning);
                }
                self.base.confirm_artifact(&self.module.dir.join(GRADLE_LOCK_FILE), None);
            }
            Err(error) => self.base.record(error),
        }
    }
}
