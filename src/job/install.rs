//! The install-then-emit job shape.
//!
//! Several ecosystems produce their lock artifact as a side effect of one
//! install-like command: yarn, npm, composer, cargo and uv. They share
//! [`InstallJob`] and differ only in an [`InstallRecipe`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{Classifier, Job, JobBase, JobErrors, StatusSink, ToolCommand, ToolContext};
use crate::resolution::registry::Ecosystem;

/// Builds the single command for a manifest.
pub type CommandBuilder = fn(&JobBase, &ToolContext) -> ToolCommand;

/// Static description of an install-then-emit ecosystem.
pub struct InstallRecipe {
    pub ecosystem: Ecosystem,
    /// Phase reported while the command runs
    pub phase: &'static str,
    pub classifier: &'static LazyLock<Classifier>,
    pub command: CommandBuilder,
    /// File the tool writes next to the manifest
    pub artifact: &'static str,
}

/// A job that runs one tool command and lets the tool write the artifact.
pub struct InstallJob {
    base: JobBase,
    recipe: &'static InstallRecipe,
    ctx: ToolContext,
}

impl InstallJob {
    pub fn new(file: impl Into<PathBuf>, recipe: &'static InstallRecipe, ctx: ToolContext) -> Self {
        Self {
            base: JobBase::new(file),
            recipe,
            ctx,
        }
    }

    /// The command this job runs.
    pub fn command(&self) -> ToolCommand {
        (self.recipe.command)(&self.base, &self.ctx)
    }

    /// Where the tool is expected to leave its artifact.
    pub fn artifact(&self) -> PathBuf {
        self.base.dir().join(self.recipe.artifact)
    }
}

#[async_trait]
impl Job for InstallJob {
    fn file(&self) -> &Path {
        self.base.file()
    }

    fn ecosystem(&self) -> Ecosystem {
        self.recipe.ecosystem
    }

    fn errors(&self) -> &JobErrors {
        self.base.errors()
    }

    async fn run(&mut self, status: &StatusSink) {
        self.base.enter(status, self.recipe.phase);
        let command = self.command();
        let command_line = command.command_line();
        let classifier: &Classifier = self.recipe.classifier;
        if self.base.exec(&self.ctx, command, classifier).await.is_none() {
            return;
        }
        if self.base.confirm_artifact(&self.artifact(), Some(command_line)) {
            tracing::debug!(target: "resolution", "{}: {} finished", self.base.file().display(), self.recipe.ecosystem);
        }
    }
}
