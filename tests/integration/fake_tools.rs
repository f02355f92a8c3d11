//! The real binary driving shell scripts that stand in for ecosystem tools.
//! Tools are swapped in through the `[tools]` table of the config file.

use predicates::prelude::*;
use std::fs;

use crate::common::{FileAssert, TestProject};

fn tools_config(project: &TestProject, tools: &[(&str, &std::path::Path)]) -> std::path::PathBuf {
    let mut config = String::from("workers = 2\n\n[tools]\n");
    for (name, path) in tools {
        config.push_str(&format!("{name} = \"{}\"\n", path.display()));
    }
    project.write_config(&config).unwrap()
}

#[test]
fn test_cargo_lock_is_generated() {
    let project = TestProject::new().unwrap();
    project.write("engine/Cargo.toml", "[package]\nname = \"engine\"\nversion = \"0.1.0\"\n").unwrap();
    // generate-lockfile --manifest-path <file>, resolved from the working directory
    let cargo = project
        .fake_tool(
            "cargo",
            r#"[ -f "$3" ] || { echo "error: manifest path \`$3\` does not exist" >&2; exit 101; }
printf '# fake lock\n' > "$(dirname "$3")/Cargo.lock""#,
        )
        .unwrap();
    let config = tools_config(&project, &[("cargo", &cargo)]);

    project
        .lockforge()
        .arg("--config")
        .arg(&config)
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolved 1 manifest(s)"));
    FileAssert::contains(project.path().join("engine/Cargo.lock"), "# fake lock");
}

#[test]
fn test_gomod_artifact_concatenates_graph_and_list() {
    let project = TestProject::new().unwrap();
    project.write("go.mod", "module example.com/app\n").unwrap();
    let go = project
        .fake_tool(
            "go",
            r#"case "$1" in
  mod) echo "example.com/app golang.org/x/text@v0.3.0" ;;
  list) echo "golang.org/x/text v0.3.0" ;;
esac"#,
        )
        .unwrap();
    let config = tools_config(&project, &[("go", &go)]);

    project.lockforge().arg("--config").arg(&config).arg("resolve").assert().success();
    let lock = fs::read_to_string(project.path().join("gomod.debricked.lock")).unwrap();
    assert_eq!(lock, "example.com/app golang.org/x/text@v0.3.0\n\ngolang.org/x/text v0.3.0\n");
}

#[test]
fn test_network_failure_exits_with_one() {
    let project = TestProject::new().unwrap();
    project.write("package.json", r#"{"dependencies":{"left-pad":"1.3.0"}}"#).unwrap();
    let npm = project
        .fake_tool(
            "npm",
            "echo 'npm ERR! request to https://registry.npmjs.org/left-pad failed, reason: getaddrinfo ENOTFOUND registry.npmjs.org' >&2\nexit 1",
        )
        .unwrap();
    let config = tools_config(&project, &[("npm", &npm)]);

    project
        .lockforge()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "--prefer-npm"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("network connection"))
        .stdout(predicate::str::contains("command: ").and(predicate::str::contains("install --ignore-scripts")))
        .stdout(predicate::str::contains("1 of 1 manifests failed"));
}

#[test]
fn test_unexecutable_gradle_wrapper_falls_back_with_warning() {
    use std::os::unix::fs::PermissionsExt;

    let project = TestProject::new().unwrap();
    project.write("settings.gradle", "rootProject.name = 'app'\n").unwrap();
    project.write("build.gradle", "").unwrap();
    let wrapper = project.write("gradlew", "#!/bin/sh\nexit 0\n").unwrap();
    fs::set_permissions(&wrapper, fs::Permissions::from_mode(0o644)).unwrap();

    // --init-script <path> <task>
    let gradle = project
        .fake_tool(
            "gradle",
            r#"case "$3" in
  debrickedFindSubProjectPaths) printf ':\t%s\n' "$(pwd -P)" > .debricked.multiprojects.txt ;;
  *) echo "compileClasspath" > gradle.debricked.lock ;;
esac"#,
        )
        .unwrap();
    let config = tools_config(&project, &[("gradle", &gradle)]);

    let output = project
        .lockforge()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["warned"], 1);
    FileAssert::exists(project.path().join("gradle.debricked.lock"));
    FileAssert::not_exists(project.path().join(".debricked.multiprojects.txt"));
}
