//! Argument handling, exit codes and report formats of the binary.

use predicates::prelude::*;

use crate::common::TestProject;

fn with_config(project: &TestProject, content: &str) -> assert_cmd::Command {
    let config = project.write_config(content).unwrap();
    let mut cmd = project.lockforge();
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn test_ecosystems_lists_registry_order() {
    let project = TestProject::new().unwrap();
    let output = with_config(&project, "").arg("ecosystems").assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();

    let names: Vec<&str> = stdout.lines().filter_map(|l| l.split_whitespace().next()).collect();
    assert_eq!(
        names,
        vec!["maven", "gradle", "sbt", "gomod", "pip", "uv", "yarn", "npm", "bower", "nuget", "composer", "cargo"]
    );
}

#[test]
fn test_ecosystems_respects_allow_list() {
    let project = TestProject::new().unwrap();
    with_config(&project, "ecosystems = [\"cargo\", \"npm\"]\n")
        .arg("ecosystems")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("npm"))
        .stdout(predicate::str::contains("maven").not());
}

#[test]
fn test_resolve_empty_project_succeeds() {
    let project = TestProject::new().unwrap();
    project.write("README.md", "# nothing to resolve\n").unwrap();
    with_config(&project, "")
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolved 0 manifest(s)"));
}

#[test]
fn test_resolve_json_report() {
    let project = TestProject::new().unwrap();
    let output =
        with_config(&project, "").args(["resolve", "--format", "json"]).assert().success().get_output().stdout.clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["total"], 0);
    assert!(summary["jobs"].as_array().unwrap().is_empty());
}

#[test]
fn test_missing_path_fails() {
    let project = TestProject::new().unwrap();
    with_config(&project, "")
        .args(["resolve", "does/not/exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("path does not exist"));
}

#[test]
fn test_unknown_ecosystem_in_config_fails() {
    let project = TestProject::new().unwrap();
    with_config(&project, "ecosystems = [\"pnpm\"]\n")
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown ecosystem 'pnpm'"))
        .stderr(predicate::str::contains("lockforge ecosystems"));
}

#[test]
fn test_invalid_config_fails() {
    let project = TestProject::new().unwrap();
    with_config(&project, "workers = \"many\"\n")
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_zero_workers_flag_rejected() {
    let project = TestProject::new().unwrap();
    project.lockforge().args(["resolve", "--workers", "0"]).assert().failure().code(2);
}
