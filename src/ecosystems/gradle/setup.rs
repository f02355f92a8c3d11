use anyhow::Result;
use async_trait::async_trait;
use glob::Pattern;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::{GradleJob, GradleProject, InitScript, run_gradle};
use crate::constants::{GRADLE_FIND_PROJECTS_TASK, GRADLE_MULTIPROJECT_FILE};
use crate::job::{Job, JobError, ToolContext};
use crate::resolution::strategy::Strategy;
use crate::utils::fs::RemoveOnDrop;

const SETTINGS_FILES: [&str; 2] = ["settings.gradle", "settings.gradle.kts"];
const BUILD_FILES: [&str; 2] = ["build.gradle", "build.gradle.kts"];

/// A module of a Gradle build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Gradle project path, `:` for the root project
    pub path: String,
    pub dir: PathBuf,
    pub project: GradleProject,
}

/// What the setup phase learned about the builds under the scan roots.
#[derive(Debug, Default)]
struct Layout {
    /// Modules keyed by canonical directory
    modules: HashMap<PathBuf, Module>,
    /// Builds whose project listing failed, with the error
    failures: Vec<(GradleProject, JobError)>,
    /// Warnings from the listing, per build root
    warnings: HashMap<PathBuf, JobError>,
}

impl Layout {
    fn failure_for(&self, dir: &Path) -> Option<&(GradleProject, JobError)> {
        self.failures.iter().find(|(project, _)| dir.starts_with(&project.root))
    }
}

/// Builds one job per Gradle module.
pub struct GradleStrategy {
    files: Vec<PathBuf>,
    paths: Vec<PathBuf>,
    ctx: ToolContext,
}

impl GradleStrategy {
    pub fn new(files: Vec<PathBuf>, paths: Vec<PathBuf>, ctx: ToolContext) -> Self {
        Self {
            files,
            paths,
            ctx,
        }
    }

    /// Directories holding a settings file, canonical and sorted.
    fn settings_roots(&self) -> BTreeSet<PathBuf> {
        let exclusions: Vec<Pattern> =
            self.ctx.config().exclusions.iter().filter_map(|p| Pattern::new(p).ok()).collect();
        let excluded = |dir: &Path| {
            let sentinel = dir.join("_");
            exclusions.iter().any(|p| p.matches_path(&sentinel))
        };

        let mut roots = BTreeSet::new();
        for path in &self.paths {
            if path.is_file() {
                if let Some(parent) = path.parent().filter(|p| has_any(p, &SETTINGS_FILES)) {
                    roots.insert(canonical(parent));
                }
                continue;
            }
            let walker = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !(e.file_type().is_dir() && e.depth() > 0 && excluded(e.path())))
                .filter_map(Result::ok);
            for entry in walker {
                let name = entry.file_name().to_string_lossy();
                if entry.file_type().is_file() && SETTINGS_FILES.contains(&name.as_ref()) {
                    if let Some(parent) = entry.path().parent() {
                        roots.insert(canonical(parent));
                    }
                }
            }
        }
        for file in &self.files {
            let dir = parent_dir(file);
            if has_any(dir, &SETTINGS_FILES) {
                roots.insert(canonical(dir));
            }
        }
        roots
    }

    /// Ask every build for its projects.
    async fn discover(&self, script: &InitScript) -> Layout {
        let mut layout = Layout::default();

        for root in self.settings_roots() {
            let project = GradleProject::at(&root, &self.ctx);
            let marker = RemoveOnDrop::new(root.join(GRADLE_MULTIPROJECT_FILE));
            let context = root.display().to_string();

            match run_gradle(&self.ctx, &project, script.path(), GRADLE_FIND_PROJECTS_TASK, &context).await {
                Ok((_, warning)) => {
                    let listing = match tokio::fs::read_to_string(marker.path()).await {
                        Ok(listing) => listing,
                        Err(e) => {
                            tracing::warn!("{} was not written: {}", marker.path().display(), e);
                            String::new()
                        }
                    };
                    // The wrapper was refused once; modules go straight to the global gradle
                    let project = if warning.is_some() { project.without_wrapper(&self.ctx) } else { project };
                    let modules = parse_multiprojects(&listing, &root);
                    tracing::debug!(target: "resolution", "{}: {} gradle project(s)", root.display(), modules.len());
                    for (path, dir) in modules {
                        layout.modules.entry(canonical(&dir)).or_insert_with(|| Module {
                            path,
                            dir,
                            project: project.clone(),
                        });
                    }
                    if let Some(warning) = warning {
                        layout.warnings.insert(root.clone(), warning);
                    }
                }
                Err(error) => {
                    tracing::debug!(target: "resolution", "{}: listing projects failed: {}", root.display(), error);
                    layout.failures.push((project, error));
                }
            }
        }
        layout
    }
}

#[async_trait]
impl Strategy for GradleStrategy {
    async fn invoke(self: Box<Self>) -> Result<Vec<Box<dyn Job>>> {
        if self.files.is_empty() {
            return Ok(Vec::new());
        }
        let script = Arc::new(InitScript::materialize()?);
        let mut layout = self.discover(&script).await;

        // Distinct module directories: matched build files first, then
        // discovered modules that have a build file of their own.
        let mut dirs: Vec<(PathBuf, PathBuf)> = Vec::new();
        let mut seen = BTreeSet::new();
        for file in &self.files {
            let dir = canonical(parent_dir(file));
            if seen.insert(dir.clone()) {
                dirs.push((dir, file.clone()));
            }
        }
        let mut discovered: Vec<&Module> = layout.modules.values().collect();
        discovered.sort_by(|a, b| a.dir.cmp(&b.dir));
        for module in discovered {
            let dir = canonical(&module.dir);
            if seen.contains(&dir) {
                continue;
            }
            if let Some(build_file) = BUILD_FILES.iter().map(|f| module.dir.join(f)).find(|f| f.is_file()) {
                seen.insert(dir.clone());
                dirs.push((dir, build_file));
            }
        }

        let mut jobs: Vec<Box<dyn Job>> = Vec::with_capacity(dirs.len());
        for (dir, file) in dirs {
            let job = if let Some(module) = layout.modules.get(&dir) {
                let mut job = GradleJob::new(file, module.clone(), Arc::clone(&script), self.ctx.clone());
                // One fallback, one warning: the first job of the build takes it
                if let Some(warning) = layout.warnings.remove(&module.project.root) {
                    job.record_setup(warning);
                }
                job
            } else if let Some((project, error)) = layout.failure_for(&dir) {
                let module = Module {
                    path: ":".to_string(),
                    dir: dir.clone(),
                    project: project.clone(),
                };
                let mut job = GradleJob::new(file, module, Arc::clone(&script), self.ctx.clone());
                job.record_setup(error.clone());
                job
            } else {
                let module = Module {
                    path: ":".to_string(),
                    dir: dir.clone(),
                    project: GradleProject::at(&dir, &self.ctx),
                };
                GradleJob::new(file, module, Arc::clone(&script), self.ctx.clone())
            };
            jobs.push(Box::new(job));
        }
        Ok(jobs)
    }
}

/// Parse `<project path>\t<dir>` lines; relative dirs are taken from `root`.
pub fn parse_multiprojects(listing: &str, root: &Path) -> Vec<(String, PathBuf)> {
    listing
        .lines()
        .filter_map(|line| {
            let (path, dir) = line.trim_end_matches('\r').split_once('\t')?;
            let (path, dir) = (path.trim(), dir.trim());
            if path.is_empty() || dir.is_empty() {
                return None;
            }
            let dir = Path::new(dir);
            let dir = if dir.is_absolute() { dir.to_path_buf() } else { root.join(dir) };
            Some((path.to_string(), dir))
        })
        .collect()
}

fn parent_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn has_any(dir: &Path, names: &[&str]) -> bool {
    names.iter().any(|name| dir.join(name).is_file())
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
