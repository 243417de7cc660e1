//! Exercises the built `dagflow` binary end-to-end against a workflow file
//! on disk, the way a user would invoke it from a shell.

use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

fn write_workflow(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp workflow file");
    file.write_all(contents.as_bytes()).expect("write workflow file");
    file
}

#[test]
fn validate_accepts_a_well_formed_workflow() {
    let file = write_workflow(
        r#"{
            "name": "demo",
            "nodes": [
                {"id": "a", "task": "arith.add", "args": [1, 2]},
                {"id": "b", "task": "arith.mul", "args": [10], "depends_on": ["a"]}
            ]
        }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_dagflow"))
        .arg("validate")
        .arg(file.path())
        .output()
        .expect("run dagflow validate");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("demo"));
}

#[test]
fn validate_rejects_a_cyclic_workflow() {
    let file = write_workflow(
        r#"{
            "name": "cyclic",
            "nodes": [
                {"id": "a", "task": "arith.add", "depends_on": ["b"]},
                {"id": "b", "task": "arith.add", "depends_on": ["a"]}
            ]
        }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_dagflow"))
        .arg("validate")
        .arg(file.path())
        .output()
        .expect("run dagflow validate");

    assert!(!output.status.success());
}

#[test]
fn run_executes_the_workflow_and_prints_json() {
    let file = write_workflow(
        r#"{
            "name": "demo",
            "nodes": [
                {"id": "a", "task": "arith.add", "args": [1, 2]},
                {"id": "b", "task": "arith.mul", "args": [10], "depends_on": ["a"]}
            ]
        }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_dagflow"))
        .arg("run")
        .arg(file.path())
        .output()
        .expect("run dagflow run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON output");
    assert_eq!(value, serde_json::json!(30.0));
}

#[test]
fn run_with_target_stops_at_the_requested_node() {
    let file = write_workflow(
        r#"{
            "name": "demo",
            "nodes": [
                {"id": "a", "task": "arith.add", "args": [1, 2]},
                {"id": "b", "task": "arith.mul", "args": [10], "depends_on": ["a"]}
            ]
        }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_dagflow"))
        .arg("run")
        .arg(file.path())
        .arg("--target")
        .arg("a")
        .output()
        .expect("run dagflow run --target");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON output");
    assert_eq!(value, serde_json::json!(3.0));
}

#[test]
fn doctor_reports_ok() {
    let output = Command::new(env!("CARGO_BIN_EXE_dagflow"))
        .arg("doctor")
        .output()
        .expect("run dagflow doctor");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok"));
}
