//! Integration tests for the `catena validate` command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn good_line() -> String {
    serde_json::json!({
        "system": "You are a careful assistant.",
        "messages": [
            {"role": "user", "content": "What is grace?"},
            {"role": "assistant", "content": "<answer><summary>s</summary><explanation>e [Source: CCC, 1996]</explanation><citations>c</citations></answer>"}
        ]
    })
    .to_string()
}

fn write_file(temp: &TempDir, lines: &[String]) -> PathBuf {
    let path = temp.path().join("data.jsonl");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn catena() -> Command {
    Command::cargo_bin("catena").unwrap()
}

#[test]
fn test_valid_file_exits_zero() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, &[good_line(), good_line()]);

    catena()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid examples: 2"))
        .stdout(predicate::str::contains("ready for training"));
}

#[test]
fn test_broken_json_exits_one() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, &["{not json".to_string(), good_line()]);

    catena()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("JSON syntax error"))
        .stdout(predicate::str::contains("Errors: 1"));
}

#[test]
fn test_wrong_role_exits_one() {
    let bad = serde_json::json!({
        "system": "s",
        "messages": [
            {"role": "user", "content": "q"},
            {"role": "user", "content": "a"}
        ]
    })
    .to_string();
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, &[good_line(), bad]);

    catena()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("role='assistant'"))
        .stdout(predicate::str::contains("Errors: 1"));
}

#[test]
fn test_warnings_alone_still_pass() {
    let plain = serde_json::json!({
        "system": "s",
        "messages": [
            {"role": "user", "content": "q"},
            {"role": "assistant", "content": "answer without markers"}
        ]
    })
    .to_string();
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, &[plain]);

    catena()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("no citations found"))
        .stdout(predicate::str::contains("missing structure tags"));
}

#[test]
fn test_empty_file_exits_one() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.jsonl");
    std::fs::write(&path, "").unwrap();

    catena()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("file is empty"));
}

#[test]
fn test_missing_file_exits_one() {
    catena()
        .arg("validate")
        .arg("/nonexistent/data.jsonl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_analyze_prints_statistics() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, &[good_line(), good_line(), good_line()]);

    catena()
        .arg("validate")
        .arg(&path)
        .arg("--analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total examples: 3"))
        .stdout(predicate::str::contains("Citation sources"))
        .stdout(predicate::str::contains("CCC: 3"));
}

#[test]
fn test_analyze_is_skipped_when_validation_fails() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, &["{not json".to_string(), good_line()]);

    catena()
        .arg("validate")
        .arg(&path)
        .arg("--analyze")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Errors: 1"))
        .stdout(predicate::str::contains("Total examples:").not())
        .stdout(predicate::str::contains("Citation sources").not());
}

#[test]
fn test_json_output_is_valid_json() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, &[good_line()]);

    let assert = catena().arg("validate").arg(&path).arg("--json").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON report");
    assert_eq!(json["valid_count"], 1);
    assert_eq!(json["error_count"], 0);
}
