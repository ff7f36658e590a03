// Command-line tests for the trialstat binary
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SESSION: &str = r#"{"name": "stm_size", "value": 30.0, "time": 0.0}
{"name": "stm_rotation_in_depth", "value": 0.0, "time": 0.1}
{"name": "Announce_TrialStart", "value": 1.0, "time": 0.2}
{"name": "success", "value": 1.0, "time": 1.0}
{"name": "stm_size", "value": 30.0, "time": 5.0}
{"name": "stm_rotation_in_depth", "value": 45.0, "time": 5.1}
{"name": "Announce_TrialStart", "value": 1.0, "time": 5.2}
{"name": "failure", "value": 1.0, "time": 6.0}
"#;

/// Two sessions for V1; V2's second session is missing from disk
fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    for name in ["V1_1.jsonl", "V1_2.jsonl", "V2_1.jsonl"] {
        fs::write(dir.path().join(name), SESSION).unwrap();
    }

    let config = format!(
        r#"root = "{}"
group_by = "rotation"
workers = 2

[bootstrap]
bin_size = 2
iterations = 100

[[subject]]
name = "V1"
sessions = ["V1_1.jsonl", "V1_2.jsonl"]
"#,
        dir.path().display()
    );
    let config_path = dir.path().join("trialstat.toml");
    fs::write(&config_path, config).unwrap();

    (dir, config_path)
}

fn add_broken_subject(config_path: &Path) {
    let mut config = fs::read_to_string(config_path).unwrap();
    config.push_str(
        r#"
[[subject]]
name = "V2"
sessions = ["V2_1.jsonl", "V2_2.jsonl"]
"#,
    );
    fs::write(config_path, config).unwrap();
}

#[test]
fn test_text_output() {
    let (_dir, config) = setup();

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C").arg(&config);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "=== Subject V1 (2 sessions, 4 trials) ===",
        ))
        .stdout(predicate::str::contains("Bootstrap discriminability"));
}

#[test]
fn test_json_output() {
    let (_dir, config) = setup();

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C").arg(&config).arg("--format").arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["format"], "trialstat-json-v1");
    assert_eq!(json["subjects"].as_array().unwrap().len(), 1);
}

#[test]
fn test_csv_output() {
    let (_dir, config) = setup();

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C")
        .arg(&config)
        .arg("--format")
        .arg("csv")
        .arg("--no-bootstrap");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("subject,session,session_id,"))
        .stdout(predicate::str::contains("V1,1,V1_1,"));
}

#[test]
fn test_failed_subject_reported_without_failing_run() {
    let (_dir, config) = setup();
    add_broken_subject(&config);

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C").arg(&config);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("=== Subject V1"))
        .stdout(predicate::str::contains("=== Failed subjects (1) ==="))
        .stdout(predicate::str::contains("V2_2.jsonl"));
}

#[test]
fn test_missing_config_fails() {
    let dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C").arg(dir.path().join("absent.toml"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_invalid_override_fails() {
    let (_dir, config) = setup();

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C").arg(&config).arg("--bin-size").arg("0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_debug_logs_to_stderr() {
    let (_dir, config) = setup();

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C").arg(&config).arg("--debug").arg("--no-bootstrap");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Analyzing 1 subjects"));
}

#[test]
fn test_policy_without_rotation_rejects_rotation_grouping() {
    let (_dir, config) = setup();

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C")
        .arg(&config)
        .arg("--policy")
        .arg("outcome-anchored");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("group_by = rotation"));
}

#[test]
fn test_policy_with_size_grouping_accepted() {
    let (_dir, config) = setup();

    let mut cmd = Command::cargo_bin("trialstat").unwrap();
    cmd.arg("-C")
        .arg(&config)
        .arg("--policy")
        .arg("outcome-anchored")
        .arg("--group-by")
        .arg("size")
        .arg("--no-bootstrap");

    cmd.assert().success();
}
