//! Gradle: one job per module of a (possibly multi-project) build.
//!
//! Gradle is the only ecosystem whose job list is not known from the file
//! list alone. [`GradleStrategy`] first locates every `settings.gradle(.kts)`
//! under the scan roots and asks each build for its projects through an
//! injected init script. It then creates one [`GradleJob`] per distinct
//! module directory.
//!
//! Builds prefer their `gradlew` wrapper. A wrapper that cannot be executed
//! is retried once with the global `gradle`; success is reported as a
//! warning. When that happens while listing projects, every module of the
//! build uses the global `gradle` directly and only one job carries the
//! warning.

mod job;
mod setup;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::NamedTempFile;

pub use job::GradleJob;
pub use setup::{GradleStrategy, Module};

use crate::constants::GRADLE_DEPENDENCIES_TASK;
use crate::core::LockforgeError;
use crate::job::classify::{Classifier, Rule, network_documentation, permission_documentation};
use crate::job::{CommandOutput, ErrorKind, JobError, ToolCommand, ToolContext, ToolError, classified_error};
use crate::utils::platform::gradle_wrapper_name;

/// The init script registering lockforge's helper tasks.
pub const INIT_SCRIPT: &str = include_str!("gradle-init-script.groovy");

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "Gradle",
        "See https://gradle.org/install/ for installation instructions, or add a Gradle wrapper to the project.",
        vec![
            Rule::new(
                ErrorKind::RegistryUnreachable,
                r"(?:Could not (?:GET|HEAD) '([^']+)'|UnknownHostException: ([\w.\-]+)|No cached version of \S+ available for offline mode)",
                |caps| {
                    let url = caps.get(1).or_else(|| caps.get(2)).map_or("the artifact repository", |m| m.as_str());
                    network_documentation(url)
                },
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"(?:Cannot find a version of '([^']+)' that satisfies the version constraints|Conflict\(s\) found for the following module\(s\):\s*- ([\w.\-]+:[\w.\-]+))",
                |caps| {
                    let module = caps.get(1).or_else(|| caps.get(2)).map_or("a dependency", |m| m.as_str());
                    format!(
                        "No version of {module} satisfies every constraint. Align the requested versions, for example \
                         with a platform or a resolutionStrategy."
                    )
                },
            ),
            Rule::new(
                ErrorKind::DependencyNotFound,
                r"Could not find ([\w.\-]+:[\w.\-]+(?::[\w.\-]+)?)\.",
                |caps| {
                    format!(
                        "Couldn't find {} in any declared repository. Please check the coordinates and the \
                         repositories block of the build.",
                        &caps[1]
                    )
                },
            ),
            Rule::new(
                ErrorKind::MalformedManifest,
                r"(?:Could not compile (?:build|settings) file '([^']+)'|Build file '([^']+)' line: \d+|Script compilation errors?)",
                |caps| {
                    let file = caps.get(1).or_else(|| caps.get(2)).map_or("the build script", |m| m.as_str());
                    format!("{file} could not be evaluated. Please fix the error reported above.")
                },
            ),
            Rule::new(ErrorKind::PermissionDenied, r"(\S+) \(Permission denied\)", |caps| {
                permission_documentation(&caps[1])
            }),
            Rule::new(ErrorKind::ToolInternalFailure, r"Unsupported class file major version (\d+)", |caps| {
                format!(
                    "This Gradle version cannot run on the installed JDK (class file version {}). Use a newer \
                     Gradle wrapper or an older JDK.",
                    &caps[1]
                )
            }),
            Rule::new(ErrorKind::ToolInternalFailure, r"Task '([^']+)' not found in (?:root )?project", |caps| {
                format!(
                    "Gradle did not register the task {}. The injected init script may not support this Gradle \
                     version.",
                    &caps[1]
                )
            }),
        ],
    )
});

/// The init script written to a temporary file for the duration of a run.
#[derive(Debug)]
pub struct InitScript {
    file: NamedTempFile,
}

impl InitScript {
    /// Write the embedded script to a fresh temporary `.gradle` file.
    pub fn materialize() -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("lockforge-init-")
            .suffix(".gradle")
            .tempfile()
            .map_err(|e| LockforgeError::ResourceError {
                name: "gradle init script".to_string(),
                reason: e.to_string(),
            })?;
        file.write_all(INIT_SCRIPT.as_bytes()).context("Failed to write gradle init script")?;
        file.flush().context("Failed to write gradle init script")?;
        Ok(Self {
            file,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// A Gradle build: its root directory and the executable that drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradleProject {
    pub root: PathBuf,
    pub program: String,
    pub uses_wrapper: bool,
}

impl GradleProject {
    /// The build rooted at `root`, using its wrapper when present.
    pub fn at(root: impl Into<PathBuf>, ctx: &ToolContext) -> Self {
        let root = root.into();
        let wrapper = root.join(gradle_wrapper_name());
        if wrapper.is_file() {
            Self {
                root,
                program: wrapper.display().to_string(),
                uses_wrapper: true,
            }
        } else {
            Self {
                root,
                program: ctx.tool("gradle"),
                uses_wrapper: false,
            }
        }
    }
}

impl GradleProject {
    /// The same build driven by the global `gradle`.
    pub fn without_wrapper(self, ctx: &ToolContext) -> Self {
        Self {
            root: self.root,
            program: ctx.tool("gradle"),
            uses_wrapper: false,
        }
    }
}

/// Fully qualified dependency task for a project path.
pub fn dependencies_task(project_path: &str) -> String {
    if project_path == ":" {
        format!(":{GRADLE_DEPENDENCIES_TASK}")
    } else {
        format!("{project_path}:{GRADLE_DEPENDENCIES_TASK}")
    }
}

/// Run Gradle for `project`, falling back to the global `gradle` when the
/// wrapper cannot be executed.
///
/// On success the second element is the warning to record when the fallback
/// was used. On failure the error is the single critical to record.
pub(crate) async fn run_gradle(
    ctx: &ToolContext,
    project: &GradleProject,
    script: &Path,
    task: &str,
    context: &str,
) -> Result<(CommandOutput, Option<JobError>), JobError> {
    let command = |program: &str| {
        ToolCommand::new(program)
            .arg("--init-script")
            .arg(script.display().to_string())
            .arg(task)
            .current_dir(&project.root)
            .with_context(context)
    };

    let first = command(&project.program);
    match ctx.runner().run(&first).await {
        Ok(output) => Ok((output, None)),
        Err(ToolError::PermissionDenied {
            program,
        }) if project.uses_wrapper => {
            tracing::warn!("{program} is not executable, retrying with the global gradle");
            let fallback = command(&ctx.tool("gradle"));
            match ctx.runner().run(&fallback).await {
                Ok(output) => {
                    let warning = JobError::warning(format!("{program} is not executable; used the global gradle instead"))
                        .with_command(first.command_line())
                        .with_documentation(
                            ErrorKind::PermissionDenied,
                            format!(
                                "The Gradle wrapper couldn't be executed, so the globally installed gradle was used. \
                                 Its version may differ from the one the build expects. Run `chmod +x {program}` to \
                                 use the wrapper."
                            ),
                        );
                    Ok((output, Some(warning)))
                }
                Err(failure) => Err(classified_error(&fallback, &failure, &CLASSIFIER)),
            }
        }
        Err(failure) => Err(classified_error(&first, &failure, &CLASSIFIER)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockRunner;

    #[test]
    fn test_dependencies_task() {
        assert_eq!(dependencies_task(":"), ":debrickedDependencies");
        assert_eq!(dependencies_task(":app:core"), ":app:core:debrickedDependencies");
    }

    #[test]
    fn test_init_script_materializes() {
        let script = InitScript::materialize().unwrap();
        let content = std::fs::read_to_string(script.path()).unwrap();
        assert!(content.contains("debrickedFindSubProjectPaths"));
        assert!(content.contains("debrickedDependencies"));
        assert!(script.path().extension().is_some_and(|e| e == "gradle"));

        let path = script.path().to_path_buf();
        drop(script);
        assert!(!path.exists());
    }

    #[test]
    fn test_project_prefers_wrapper() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = MockRunner::new().context();
        assert!(!GradleProject::at(temp.path(), &ctx).uses_wrapper);

        std::fs::write(temp.path().join(gradle_wrapper_name()), "#!/bin/sh\n").unwrap();
        let project = GradleProject::at(temp.path(), &ctx);
        assert!(project.uses_wrapper);
        assert!(project.program.ends_with(gradle_wrapper_name()));
    }

    #[test]
    fn test_without_wrapper() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(gradle_wrapper_name()), "#!/bin/sh\n").unwrap();
        let ctx = MockRunner::new().context();
        let project = GradleProject::at(temp.path(), &ctx).without_wrapper(&ctx);
        assert!(!project.uses_wrapper);
        assert_eq!(project.program, "gradle");
        assert_eq!(project.root, temp.path());
    }

    #[test]
    fn test_classification() {
        let (kind, doc) = CLASSIFIER.classify_text(
            "> Could not resolve all files for configuration ':app:runtimeClasspath'.\n   \
             > Could not find com.acme:gone:1.0.\n     Searched in the following locations:",
        );
        assert_eq!(kind, ErrorKind::DependencyNotFound);
        assert!(doc.contains("com.acme:gone:1.0"));

        let (kind, doc) = CLASSIFIER.classify_text(
            "> Could not resolve com.acme:lib:1.0.\n  > Could not GET 'https://repo.maven.apache.org/maven2/com/acme/lib/1.0/lib-1.0.pom'.",
        );
        assert_eq!(kind, ErrorKind::RegistryUnreachable);
        assert!(doc.contains("network connection"));
    }
}
