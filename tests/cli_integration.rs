//! CLI integration tests against the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn rudder() -> Command {
    Command::cargo_bin("rudder").unwrap()
}

#[test]
fn test_help_lists_commands() {
    rudder()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_version_flag() {
    rudder()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_config_init_writes_loadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rudder.toml");

    rudder()
        .args(["config", "init", "-o"])
        .arg(&output)
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("[probe]"));
    assert!(written.contains("[[groups]]"));
}

#[test]
fn test_config_init_refuses_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rudder.toml");
    std::fs::write(&output, "# keep me").unwrap();

    rudder()
        .args(["config", "init", "-o"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_probe_missing_config_fails() {
    rudder()
        .args(["probe", "-c", "/nonexistent/rudder.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_probe_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("rudder.toml");
    std::fs::write(
        &config,
        r#"
        [probe]
        interval_seconds = 0
        "#,
    )
    .unwrap();

    rudder()
        .args(["probe", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval"));
}

#[test]
fn test_probe_reports_unreachable_workers() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("rudder.toml");
    std::fs::write(
        &config,
        r#"
        [probe]
        timeout_ms = 200
        retries = 0

        [[groups]]
        name = "cluster1"
        routing_target = "rt-1"

        [[groups.workers]]
        id = "w1"
        address = "http://127.0.0.1:9"
        "#,
    )
    .unwrap();

    rudder()
        .args(["probe", "--json", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"w1\""));
}

#[test]
fn test_status_unreachable_daemon_fails() {
    rudder()
        .args(["status", "-e", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_completions_bash() {
    rudder()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rudder"));
}
