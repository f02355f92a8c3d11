//! NuGet: `dotnet restore` with a lock file.
//!
//! SDK-style projects are restored directly. A legacy `packages.config` is
//! first converted into a temporary SDK-style project next to it, which is
//! removed again whatever the outcome.

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::job::classify::{Classifier, Rule, network_documentation, permission_documentation};
use crate::job::{
    ErrorKind, Job, JobBase, JobError, JobErrors, PHASE_INSTALL, StatusSink, ToolCommand, ToolContext,
};
use crate::resolution::registry::{Ecosystem, hidden_lock_name};
use crate::utils::fs::{RemoveOnDrop, atomic_write};

/// Name of the legacy manifest.
pub const PACKAGES_CONFIG: &str = "packages.config";
/// Temporary project generated from a `packages.config`.
pub const CONVERTED_PROJECT: &str = ".packages.config.debricked.csproj";
/// Target framework used when `packages.config` names none.
pub const DEFAULT_TARGET_FRAMEWORK: &str = "net48";
/// Phase reported while `packages.config` is converted.
pub const PHASE_CONVERT: &str = "converting packages.config";

pub static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(
        "dotnet",
        "See https://dotnet.microsoft.com/download for installation instructions.",
        vec![
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"NU1102: Unable to find package (\S+) with version \(([^)]+)\)",
                |caps| {
                    format!(
                        "No version of {} satisfies {}. Please check the version in the project file.",
                        &caps[1], &caps[2]
                    )
                },
            ),
            Rule::new(ErrorKind::DependencyNotFound, r"NU1101: Unable to find package ([^\s.]+(?:\.[^\s.]+)*)\.", |caps| {
                format!(
                    "Couldn't find the package {} in any configured source. Please check the package id and your \
                     NuGet.Config sources.",
                    &caps[1]
                )
            }),
            Rule::new(
                ErrorKind::RegistryUnreachable,
                r"NU1301: (?:Unable to load the service index for source|Failed to retrieve information about \S+ from remote source) (\S+?)\.?(?:\s|$)",
                |caps| network_documentation(&caps[1]),
            ),
            Rule::new(
                ErrorKind::VersionNotSatisfiable,
                r"(?:NU1107|NU1605|NU1608): [^\n]*?(?:for|of) ([\w.\-]+)",
                |caps| {
                    format!(
                        "The version constraints on {} conflict. Please reference a version that satisfies every \
                         project, or add a direct reference to pin it.",
                        &caps[1]
                    )
                },
            ),
            Rule::new(ErrorKind::MalformedManifest, r"MSB4025: The project file could not be loaded\. ?([^\n]*)", |caps| {
                format!("The project file could not be parsed: {}", &caps[1])
            }),
            Rule::new(ErrorKind::PermissionDenied, r"Access to the path '([^']+)' is denied", |caps| {
                permission_documentation(&caps[1])
            }),
            Rule::new(
                ErrorKind::ToolInternalFailure,
                r"NETSDK1045: The current \.NET SDK does not support targeting ([^\s]+?)\.?\s",
                |caps| {
                    format!(
                        "The installed .NET SDK cannot target {}. Please install a newer SDK.",
                        &caps[1]
                    )
                },
            ),
        ],
    )
});

#[allow(clippy::expect_used)]
static PACKAGE_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<package\s([^>]*?)/?>").expect("static pattern"));

#[allow(clippy::expect_used)]
static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:]+)\s*=\s*"([^"]*)""#).expect("static pattern"));

/// One `<package>` entry of a `packages.config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub id: String,
    pub version: String,
    pub target_framework: Option<String>,
}

/// Extract the package entries of a `packages.config` document.
pub fn parse_packages_config(content: &str) -> Vec<PackageEntry> {
    PACKAGE_ELEMENT
        .captures_iter(content)
        .filter_map(|element| {
            let mut id = None;
            let mut version = None;
            let mut target_framework = None;
            for attr in ATTRIBUTE.captures_iter(&element[1]) {
                let value = attr[2].to_string();
                match &attr[1] {
                    "id" => id = Some(value),
                    "version" => version = Some(value),
                    "targetFramework" => target_framework = Some(value),
                    _ => {}
                }
            }
            Some(PackageEntry {
                id: id?,
                version: version?,
                target_framework,
            })
        })
        .collect()
}

/// Render an SDK-style project referencing every entry.
pub fn render_project(entries: &[PackageEntry]) -> String {
    let mut frameworks: BTreeSet<&str> = entries.iter().filter_map(|e| e.target_framework.as_deref()).collect();
    if frameworks.is_empty() {
        frameworks.insert(DEFAULT_TARGET_FRAMEWORK);
    }
    let frameworks = frameworks.into_iter().collect::<Vec<_>>().join(";");

    let mut project = String::new();
    let _ = writeln!(project, "<Project Sdk=\"Microsoft.NET.Sdk\">");
    let _ = writeln!(project, "  <PropertyGroup>");
    let _ = writeln!(project, "    <TargetFrameworks>{frameworks}</TargetFrameworks>");
    let _ = writeln!(project, "  </PropertyGroup>");
    let _ = writeln!(project, "  <ItemGroup>");
    for entry in entries {
        let _ = writeln!(project, "    <PackageReference Include=\"{}\" Version=\"{}\" />", entry.id, entry.version);
    }
    let _ = writeln!(project, "  </ItemGroup>");
    let _ = writeln!(project, "</Project>");
    project
}

pub struct NugetJob {
    base: JobBase,
    ctx: ToolContext,
}

impl NugetJob {
    pub fn new(file: impl Into<PathBuf>, ctx: ToolContext) -> Self {
        Self {
            base: JobBase::new(file),
            ctx,
        }
    }

    fn is_packages_config(&self) -> bool {
        self.base.file_name() == PACKAGES_CONFIG
    }

    fn restore(&self, project: &Path, lock: &Path) -> ToolCommand {
        ToolCommand::new(self.ctx.tool("dotnet"))
            .arg("restore")
            .arg(project.display().to_string())
            .args(["--use-lock-file", "--lock-file-path"])
            .arg(lock.display().to_string())
            .current_dir(self.base.dir())
    }

    async fn restore_into(&mut self, restore: ToolCommand, lock: &Path) {
        let command_line = restore.command_line();
        if self.base.exec(&self.ctx, restore, &CLASSIFIER).await.is_some() {
            self.base.confirm_artifact(lock, Some(command_line));
        }
    }

    /// Write the converted project; on failure record it and return `None`.
    async fn convert(&mut self) -> Option<RemoveOnDrop> {
        let content = match tokio::fs::read_to_string(self.base.file()).await {
            Ok(content) => content,
            Err(e) => {
                self.base.record(JobError::critical(e.to_string()).with_documentation(
                    ErrorKind::PermissionDenied,
                    permission_documentation(&self.base.file().display().to_string()),
                ));
                return None;
            }
        };

        let entries = parse_packages_config(&content);
        tracing::debug!(target: "resolution", "{}: {} package(s)", self.base.file().display(), entries.len());
        let project = self.base.dir().join(CONVERTED_PROJECT);
        // Guard first, so a partially written project is removed too
        let guard = RemoveOnDrop::new(&project);
        if let Err(e) = atomic_write(&project, render_project(&entries).as_bytes()) {
            self.base.record(JobError::critical(format!("{e:#}")).with_documentation(
                ErrorKind::PermissionDenied,
                permission_documentation(&project.display().to_string()),
            ));
            return None;
        }
        Some(guard)
    }
}

#[async_trait]
impl Job for NugetJob {
    fn file(&self) -> &Path {
        self.base.file()
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Nuget
    }

    fn errors(&self) -> &JobErrors {
        self.base.errors()
    }

    async fn run(&mut self, status: &StatusSink) {
        if self.is_packages_config() {
            self.base.enter(status, PHASE_CONVERT);
            let Some(project) = self.convert().await else {
                return;
            };
            self.base.enter(status, PHASE_INSTALL);
            let lock = self.base.dir().join(hidden_lock_name(PACKAGES_CONFIG, Ecosystem::Nuget));
            let restore = self.restore(project.path(), &lock);
            self.restore_into(restore, &lock).await;
        } else {
            self.base.enter(status, PHASE_INSTALL);
            let lock = self.base.dir().join("packages.lock.json");
            let restore = self.restore(self.base.path(), &lock);
            self.restore_into(restore, &lock).await;
        }
    }
}

pub fn job(file: PathBuf, ctx: ToolContext) -> Box<dyn Job> {
    Box::new(NugetJob::new(file, ctx))
}
