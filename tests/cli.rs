// ABOUTME: Integration tests for the flotilla CLI commands.
// ABOUTME: Validates --help, init, plan, and validation exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn flotilla_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("flotilla"))
}

#[test]
fn help_shows_commands() {
    flotilla_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn init_creates_descriptor_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let descriptor_path = temp_dir.path().join("flotilla.yml");

    flotilla_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(descriptor_path.exists(), "flotilla.yml should be created");
    let content = fs::read_to_string(&descriptor_path).unwrap();
    assert!(content.contains("services:"), "template should declare services");
    assert!(content.contains("depends_on:"), "template should show a dependency");
}

#[test]
fn init_refuses_to_overwrite_existing_descriptor() {
    let temp_dir = tempfile::tempdir().unwrap();
    let descriptor_path = temp_dir.path().join("flotilla.yml");

    fs::write(&descriptor_path, "existing: descriptor").unwrap();

    flotilla_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn plan_prints_batches_without_a_runtime() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("flotilla.yml"),
        r#"
project: etl
services:
  zookeeper:
    image: zk:3.8
  kafka:
    image: kafka:3.7
    depends_on: [zookeeper]
  init-topics:
    image: kafka:3.7
    depends_on: [kafka]
    one_shot: true
"#,
    )
    .unwrap();

    flotilla_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("batch 1: zookeeper"))
        .stdout(predicate::str::contains("batch 2: kafka"))
        .stdout(predicate::str::contains("batch 3: init-topics (one-shot)"));
}

#[test]
fn missing_descriptor_exits_with_code_two() {
    let temp_dir = tempfile::tempdir().unwrap();

    flotilla_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn malformed_descriptor_exits_with_code_two() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("flotilla.yml"),
        "services:\n  app:\n    ports: [\"80:80\"]\n",
    )
    .unwrap();

    flotilla_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn dangling_dependency_exits_with_code_three() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("flotilla.yml"),
        "services:\n  app:\n    image: app:1\n    depends_on: [ghost]\n",
    )
    .unwrap();

    flotilla_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("undeclared"));
}

#[test]
fn dependency_cycle_exits_with_code_four() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("flotilla.yml"),
        "services:\n  a:\n    image: app:1\n    depends_on: [b]\n  b:\n    image: app:1\n    depends_on: [a]\n",
    )
    .unwrap();

    flotilla_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("circular"));
}

#[test]
fn file_flag_overrides_discovery() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("custom.yml");
    fs::write(&path, "services:\n  app:\n    image: app:1\n").unwrap();

    flotilla_cmd()
        .current_dir(temp_dir.path())
        .args(["--file", "custom.yml", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch 1: app"));
}
