use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::{CLASSIFIER, PHASE_VENV, join_sections, parse_pip_list};
use crate::job::classify::permission_documentation;
use crate::job::{
    ErrorKind, Job, JobBase, JobError, JobErrors, PHASE_GRAPH, PHASE_INSTALL, PHASE_LOCK, StatusSink, ToolCommand,
    ToolContext,
};
use crate::resolution::registry::{Ecosystem, hidden_lock_name};
use crate::utils::platform::venv_executable;

pub struct PipJob {
    base: JobBase,
    ctx: ToolContext,
}

impl PipJob {
    pub fn new(file: impl Into<PathBuf>, ctx: ToolContext) -> Self {
        Self {
            base: JobBase::new(file),
            ctx,
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.base.dir().join(hidden_lock_name(&self.base.file_name(), Ecosystem::Pip))
    }

    fn pip(&self, venv: &Path) -> ToolCommand {
        ToolCommand::new(venv_executable(venv, "pip").display().to_string()).current_dir(self.base.dir())
    }

    fn record_io(&mut self, error: &std::io::Error, path: &Path) {
        self.base.record(
            JobError::critical(error.to_string())
                .with_documentation(ErrorKind::PermissionDenied, permission_documentation(&path.display().to_string())),
        );
    }

    /// Create the private environment. Dropping the handle deletes it.
    async fn create_venv(&mut self) -> Option<TempDir> {
        let venv = match tempfile::Builder::new().prefix("lockforge-venv-").tempdir() {
            Ok(venv) => venv,
            Err(e) => {
                self.record_io(&e, &std::env::temp_dir());
                return None;
            }
        };
        let python = self.ctx.tool(&self.ctx.config().python);
        let create = ToolCommand::new(python)
            .args(["-m", "venv"])
            .arg(venv.path().display().to_string())
            .current_dir(self.base.dir());
        self.base.exec(&self.ctx, create, &CLASSIFIER).await?;
        Some(venv)
    }
}

#[async_trait]
impl Job for PipJob {
    fn file(&self) -> &Path {
        self.base.file()
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pip
    }

    fn errors(&self) -> &JobErrors {
        self.base.errors()
    }

    async fn run(&mut self, status: &StatusSink) {
        self.base.enter(status, PHASE_VENV);
        let Some(venv) = self.create_venv().await else {
            return;
        };

        self.base.enter(status, PHASE_INSTALL);
        let install = self
            .pip(venv.path())
            .args(["install", "-r"])
            .arg(self.base.file_name())
            .args(["--no-input", "--disable-pip-version-check", "--prefer-binary"]);
        if self.base.exec(&self.ctx, install, &CLASSIFIER).await.is_none() {
            return;
        }

        self.base.enter(status, PHASE_GRAPH);
        let manifest = match tokio::fs::read_to_string(self.base.file()).await {
            Ok(content) => content,
            Err(e) => {
                let file = self.base.file().to_path_buf();
                self.record_io(&e, &file);
                return;
            }
        };
        let list_cmd = self.pip(venv.path()).arg("list");
        let Some(list) = self.base.exec(&self.ctx, list_cmd, &CLASSIFIER).await else {
            return;
        };
        let packages = parse_pip_list(&list.stdout);
        let show = if packages.is_empty() {
            String::new()
        } else {
            let show_cmd = self.pip(venv.path()).arg("show").args(packages);
            match self.base.exec(&self.ctx, show_cmd, &CLASSIFIER).await {
                Some(output) => output.stdout,
                None => return,
            }
        };

        self.base.enter(status, PHASE_LOCK);
        let lock = self.lock_path();
        self.base.write_artifact(&lock, &join_sections(&[&manifest, &list.stdout, &show]));
        drop(venv);
    }
}
