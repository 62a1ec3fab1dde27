//! Integration tests for the Fortuna CLI

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the fortuna binary
fn fortuna() -> Command {
    Command::new(cargo::cargo_bin!("fortuna"))
}

/// Write a config that keeps every test offline and fast: local source
/// with no artificial delay, counter pointed at a dead loopback port.
fn write_offline_config(dir: &std::path::Path) {
    let config = serde_json::json!({
        "source": { "kind": "local", "delay_ms": 0 },
        "stats": { "endpoint": "http://127.0.0.1:9/api/click", "timeout_secs": 2 }
    });
    std::fs::write(
        dir.join("fortuna.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_help() {
    fortuna()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("crystal ball"));
}

#[test]
fn test_version() {
    fortuna()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_init_creates_config() {
    let temp = TempDir::new().unwrap();

    fortuna()
        .arg("--project")
        .arg(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("fortuna.json"));

    assert!(temp.path().join("fortuna.json").exists());
}

#[test]
fn test_init_refuses_second_run() {
    let temp = TempDir::new().unwrap();

    fortuna()
        .arg("--project")
        .arg(temp.path())
        .arg("init")
        .assert()
        .success();

    fortuna()
        .arg("--project")
        .arg(temp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_predict_with_local_source() {
    let temp = TempDir::new().unwrap();
    write_offline_config(temp.path());

    fortuna()
        .arg("--project")
        .arg(temp.path())
        .arg("predict")
        .arg("--no-stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("The year ahead holds"));
}

#[test]
fn test_predict_source_override_is_validated() {
    let temp = TempDir::new().unwrap();
    write_offline_config(temp.path());

    fortuna()
        .arg("--project")
        .arg(temp.path())
        .arg("predict")
        .arg("--source")
        .arg("tarot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tarot"));
}

/// Stats failures never break the command; the counter shows as unknown.
#[test]
fn test_stats_unreachable_counter_reports_unknown() {
    let temp = TempDir::new().unwrap();
    write_offline_config(temp.path());

    fortuna()
        .arg("--project")
        .arg(temp.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown"));
}

/// Counter increment failures are absorbed; predict still succeeds.
#[test]
fn test_predict_survives_unreachable_counter() {
    let temp = TempDir::new().unwrap();
    write_offline_config(temp.path());

    fortuna()
        .arg("--project")
        .arg(temp.path())
        .arg("predict")
        .assert()
        .success()
        .stdout(predicate::str::contains("The year ahead holds"));
}

/// A generative session with no credential settles on the failed phase:
/// one generic "try again later" message, dedicated exit code.
#[test]
fn test_predict_gemini_without_key_fails_gracefully() {
    let temp = TempDir::new().unwrap();
    let config = serde_json::json!({
        "source": {
            "kind": "gemini",
            "api_key_env": "FORTUNA_CLI_TEST_NO_SUCH_KEY",
            "timeout_secs": 2
        },
        "stats": { "endpoint": "http://127.0.0.1:9/api/click", "timeout_secs": 2 }
    });
    std::fs::write(
        temp.path().join("fortuna.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();

    fortuna()
        .env_remove("FORTUNA_CLI_TEST_NO_SUCH_KEY")
        .arg("--project")
        .arg(temp.path())
        .arg("predict")
        .arg("--no-stats")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Try again later"));
}

#[test]
fn test_malformed_config_fails_with_config_exit_code() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("fortuna.json"), "{ nope").unwrap();

    fortuna()
        .arg("--project")
        .arg(temp.path())
        .arg("predict")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Configuration error"));
}
