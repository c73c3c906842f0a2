// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! End-to-end tests for the jobflow binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const NOW: &str = "2025-03-01T08:00:00Z";

fn jobflow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("jobflow").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("JOBFLOW_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    jobflow(&dir).args(["init", "demo"]).assert().success();
    dir
}

#[test]
fn test_init_writes_sample_job() {
    let dir = TempDir::new().unwrap();

    jobflow(&dir)
        .args(["init", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created job.yaml"));

    let content = std::fs::read_to_string(dir.path().join("job.yaml")).unwrap();
    assert!(content.contains("name: \"demo\""));

    // refuses to overwrite without --force
    jobflow(&dir)
        .args(["init", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    jobflow(&dir).args(["init", "demo", "--force"]).assert().success();
}

#[test]
fn test_validate_sample_job() {
    let dir = initialized();

    jobflow(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Job is valid!"));
}

#[test]
fn test_validate_reports_cycle() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("job.yaml"),
        r#"
name: loop
nodes:
  - { id: a, kind: { type: service, service: sa }, successors: [b] }
  - { id: b, kind: { type: service, service: sb }, successors: [a] }
services:
  - { id: sa, name: A, tasks: [] }
  - { id: sb, name: B, tasks: [] }
"#,
    )
    .unwrap();

    jobflow(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Circular dependency"));
}

#[test]
fn test_plan_json() {
    let dir = initialized();

    jobflow(&dir)
        .args(["plan", "--format", "json", "--now", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_duration_minutes\": 180"))
        .stdout(predicate::str::contains("\"exact\": true"))
        .stdout(predicate::str::contains("\"civil-works\""));
}

#[test]
fn test_plan_text() {
    let dir = initialized();

    jobflow(&dir)
        .args(["plan", "--now", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("Job: demo"))
        .stdout(predicate::str::contains("civil-works | electrical"))
        .stdout(predicate::str::contains("Estimated duration"));
}

#[test]
fn test_plan_missing_job() {
    let dir = TempDir::new().unwrap();

    jobflow(&dir)
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("jobflow init"));
}

#[test]
fn test_graph_text() {
    let dir = initialized();

    jobflow(&dir)
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("survey (service:site-survey)"))
        .stdout(predicate::str::contains("[after: civil, electrical]"));
}

#[test]
fn test_graph_mermaid() {
    let dir = initialized();

    jobflow(&dir)
        .args(["graph", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("graph"));
}

#[test]
fn test_task_done_advances_service() {
    let dir = initialized();

    jobflow(&dir)
        .args(["task", "done", "measure", "--now", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated job.yaml"));

    let content = std::fs::read_to_string(dir.path().join("job.yaml")).unwrap();
    assert!(content.contains("status: done"));
    assert!(content.contains("status: running"));

    jobflow(&dir)
        .args(["plan", "--format", "json", "--now", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"task_id\": \"report\""));
}

#[test]
fn test_task_unknown() {
    let dir = initialized();

    jobflow(&dir)
        .args(["task", "done", "nope", "--now", NOW])
        .assert()
        .failure();
}

#[test]
fn test_plan_write_marks_overdue() {
    let dir = initialized();

    jobflow(&dir)
        .args(["plan", "--write", "--now", NOW])
        .assert()
        .success();

    // measure has 60 minutes; two hours later it is overdue
    jobflow(&dir)
        .args(["plan", "--format", "json", "--now", "2025-03-01T10:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"overdue\""));
}
