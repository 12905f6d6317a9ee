//! End-to-end checks of the vmsync binary surface.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn vmsync() -> Command {
    Command::cargo_bin("vmsync").expect("binary builds")
}

#[test]
fn help_lists_options() {
    vmsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--destination"));
}

#[test]
fn version_reports_name() {
    vmsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vmsync"));
}

#[test]
fn missing_config_exits_with_failure() {
    vmsync()
        .args(["--config", "/nonexistent/vmsync.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("config"));
}

#[test]
fn malformed_config_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{not json").unwrap();

    vmsync()
        .args(["--config", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("parse"));
}

#[test]
fn refused_connection_reports_code_in_event_stream() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mirror");
    let path = dir.path().join("config.json");
    // Port 1 on the loopback interface refuses immediately.
    fs::write(
        &path,
        format!(
            r#"{{
                "hostname": "127.0.0.1:1",
                "username": "FIELD",
                "password": "SERVICE",
                "source": "/DISK0/ARCHIVE",
                "destination": {destination:?}
            }}"#
        ),
    )
    .unwrap();

    let assert = vmsync()
        .args(["--config", path.to_str().unwrap()])
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let last = stdout.lines().last().expect("completion event");
    let event: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(event["complete"], 1);
    assert_eq!(event["code"], 10061);
}

#[test]
fn unknown_flag_is_a_usage_error() {
    vmsync()
        .arg("--bogus")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--bogus"));
}
