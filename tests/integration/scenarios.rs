//! The resolution engine end to end, with every external tool scripted by
//! [`MockRunner`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lockforge::config::ResolveConfig;
use lockforge::constants::{GRADLE_LOCK_FILE, GRADLE_MULTIPROJECT_FILE, MAVEN_LOCK_FILE};
use lockforge::job::{CommandOutput, ErrorKind, Job, ToolError};
use lockforge::resolution::{Discovery, Registry, Resolution, Resolver};
use lockforge::test_utils::{MockRunner, init_test_logging};

use crate::common::{FileAssert, TestProject};

fn config() -> ResolveConfig {
    ResolveConfig {
        workers: 1,
        progress: false,
        ..ResolveConfig::default()
    }
}

/// Discover under the project root and resolve what was found.
async fn resolve(project: &TestProject, config: ResolveConfig, runner: &MockRunner) -> Resolution {
    init_test_logging(None);
    let paths = vec![project.path().to_path_buf()];
    let discovery = Discovery::new(Registry::from_config(&config).unwrap(), &config.exclusions).unwrap();
    let files = discovery.find(&paths, false).unwrap();
    let resolver = Resolver::from_config(config, Arc::new(runner.clone())).unwrap();
    resolver.resolve(&files, &paths).await.unwrap()
}

fn job<'a>(resolution: &'a Resolution, file: &Path) -> &'a dyn Job {
    resolution.job(file).unwrap_or_else(|| panic!("no job for {}", file.display()))
}

#[tokio::test]
async fn test_network_failure_is_one_documented_critical() {
    let project = TestProject::new().unwrap();
    let manifest = project.write("web/package.json", r#"{"dependencies":{"left-pad":"1.3.0"}}"#).unwrap();
    let runner = MockRunner::new().fail(
        "npm install",
        1,
        "npm ERR! code ENOTFOUND\nnpm ERR! syscall getaddrinfo\n\
         npm ERR! network request to https://registry.npmjs.org/left-pad failed, reason: getaddrinfo ENOTFOUND registry.npmjs.org",
    );
    let config = ResolveConfig {
        prefer_npm: true,
        ..config()
    };

    let resolution = resolve(&project, config, &runner).await;
    assert!(resolution.has_err());
    assert!(resolution.has_critical());

    let errors: Vec<_> = job(&resolution, &manifest).errors().all().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::RegistryUnreachable);
    assert!(errors[0].documentation().contains("network connection"));
    assert_eq!(errors[0].command(), Some(runner.invocations()[0].as_str()));
}

#[tokio::test]
async fn test_two_ecosystems_with_one_worker() {
    let project = TestProject::new().unwrap();
    let pom = project.write("service/pom.xml", "<project/>").unwrap();
    let gomod = project.write("tool/go.mod", "module example.com/tool\n").unwrap();
    let runner = MockRunner::new()
        .respond("go mod graph", "example.com/tool a@v1\n")
        .respond("go list", "a v1\n")
        .writes("mvn", MAVEN_LOCK_FILE, "1 com.acme:service:jar:1.0\n#\n");

    let resolution = resolve(&project, config(), &runner).await;
    assert_eq!(resolution.len(), 2);
    assert!(!resolution.has_err());
    assert_eq!(resolution.jobs()[0].file(), pom.as_path());
    assert_eq!(resolution.jobs()[1].file(), gomod.as_path());
    FileAssert::exists(project.path().join("tool/gomod.debricked.lock"));
}

#[tokio::test]
async fn test_missing_tool_is_one_error_naming_it() {
    let project = TestProject::new().unwrap();
    let manifest = project.write("go.mod", "module example.com/app\n").unwrap();
    let runner = MockRunner::new().missing("go");

    let resolution = resolve(&project, config(), &runner).await;
    let errors: Vec<_> = job(&resolution, &manifest).errors().all().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::ExecutableNotFound);
    assert!(errors[0].documentation().contains("Go"));
    assert_eq!(runner.invocations().len(), 1, "no further phases after a missing tool");
}

#[tokio::test]
async fn test_gradle_multi_project_makes_one_job_per_module_dir() {
    let project = TestProject::new().unwrap();
    let root = project.path().to_path_buf();
    project.write("settings.gradle", "include 'app', 'lib'\n").unwrap();
    project.write("build.gradle", "").unwrap();
    project.write("app/build.gradle", "").unwrap();
    project.write("app/build.gradle.kts", "").unwrap();
    project.write("lib/build.gradle.kts", "").unwrap();

    let listing = format!(":\t{0}\n:app\t{0}/app\n:lib\t{0}/lib\n", root.display());
    let runner = MockRunner::new()
        .handle("debrickedFindSubProjectPaths", move |cmd| {
            let dir = cmd.get_current_dir().unwrap_or(Path::new("."));
            fs::write(dir.join(GRADLE_MULTIPROJECT_FILE), &listing).unwrap();
            Ok(CommandOutput::default())
        })
        .handle("debrickedDependencies", |cmd| {
            // `:app:debrickedDependencies` writes into <root>/app
            let root = cmd.get_current_dir().unwrap_or(Path::new("."));
            let task = cmd.get_args().last().cloned().unwrap_or_default();
            let module = task.trim_end_matches("debrickedDependencies").trim_matches(':');
            fs::write(root.join(module).join(GRADLE_LOCK_FILE), "compileClasspath\n").unwrap();
            Ok(CommandOutput::default())
        });

    let resolution = resolve(&project, config(), &runner).await;
    assert_eq!(resolution.len(), 3);
    assert!(!resolution.has_err());

    let tasks: Vec<String> = runner
        .commands()
        .iter()
        .filter_map(|c| c.get_args().last().cloned())
        .filter(|task| task.ends_with(":debrickedDependencies"))
        .collect();
    assert_eq!(tasks.len(), 3);
    for expected in [":debrickedDependencies", ":app:debrickedDependencies", ":lib:debrickedDependencies"] {
        assert!(tasks.iter().any(|t| t == expected), "missing {expected} in {tasks:?}");
    }
    FileAssert::not_exists(root.join(GRADLE_MULTIPROJECT_FILE));
    for module in ["", "app", "lib"] {
        FileAssert::exists(root.join(module).join(GRADLE_LOCK_FILE));
    }
}

#[tokio::test]
async fn test_rerun_is_identical() {
    let project = TestProject::new().unwrap();
    project.write("go.mod", "module example.com/app\n").unwrap();
    let pom = project.write("svc/pom.xml", "<project/>").unwrap();
    let runner = MockRunner::new()
        .respond("go mod graph", "example.com/app golang.org/x/text@v0.3.0\n")
        .respond("go list", "example.com/app\ngolang.org/x/text v0.3.0\n")
        .fail(
            "mvn",
            1,
            "[ERROR] Failed to execute goal on project svc: Could not resolve dependencies for project a:svc:jar:1.0: \
             Could not find artifact com.acme:gone:jar:1.0 in central (https://repo.maven.apache.org/maven2)",
        );
    let lock = project.path().join("gomod.debricked.lock");

    let paths = vec![project.path().to_path_buf()];
    let files = vec![project.path().join("go.mod"), pom.clone()];
    let resolver = Resolver::from_config(config(), Arc::new(runner.clone())).unwrap();

    let first = resolver.resolve(&files, &paths).await.unwrap();
    let artifact = fs::read(&lock).unwrap();
    let second = resolver.resolve(&files, &paths).await.unwrap();

    assert_eq!(fs::read(&lock).unwrap(), artifact);
    let classify = |r: &Resolution| -> Vec<(ErrorKind, String)> {
        job(r, &pom).errors().all().map(|e| (e.kind(), e.documentation().to_string())).collect()
    };
    assert_eq!(classify(&first), classify(&second));
    assert_eq!(classify(&first)[0].0, ErrorKind::DependencyNotFound);
}

#[tokio::test]
async fn test_failure_after_partial_write_is_an_error() {
    let project = TestProject::new().unwrap();
    let manifest = project
        .write(
            "legacy/packages.config",
            r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Serilog" version="2.10.0" targetFramework="net472" />
</packages>
"#,
        )
        .unwrap();
    let runner = MockRunner::new().handle("dotnet restore", |cmd| {
        Err(ToolError::failed(
            cmd.program(),
            1,
            "error NU1101: Unable to find package Serilog. No packages exist with this id in source(s): nuget.org",
        ))
    });

    let resolution = resolve(&project, config(), &runner).await;
    assert!(resolution.has_err());
    let errors = job(&resolution, &manifest).errors();
    assert_eq!(errors.criticals()[0].kind(), ErrorKind::DependencyNotFound);
    FileAssert::not_exists(project.path().join("legacy/.packages.config.debricked.csproj"));
}

#[tokio::test]
async fn test_existing_lock_files_are_skipped() {
    let project = TestProject::new().unwrap();
    project.write("web/package.json", "{}").unwrap();
    project.write("web/yarn.lock", "").unwrap();
    let cargo = project.write("core/Cargo.toml", "[package]\nname = \"core\"\n").unwrap();

    let runner = MockRunner::new();
    let resolution = resolve(&project, config(), &runner).await;
    assert_eq!(resolution.len(), 1);
    assert_eq!(resolution.jobs()[0].file(), cargo.as_path());
    assert_eq!(runner.invocations()[0], format!("cargo generate-lockfile --manifest-path {}", cargo.display()));
}

#[tokio::test]
async fn test_excluded_directories_are_not_resolved() {
    let project = TestProject::new().unwrap();
    project.write("node_modules/left-pad/package.json", "{}").unwrap();
    project.write("vendor/acme/lib/composer.json", "{}").unwrap();
    let kept: PathBuf = project.write("package.json", "{}").unwrap();

    let resolution = resolve(&project, config(), &MockRunner::new()).await;
    assert_eq!(resolution.len(), 1);
    assert_eq!(resolution.jobs()[0].file(), kept.as_path());
}
