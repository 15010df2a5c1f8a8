//! CLI integration tests
//!
//! Tests the flock CLI using assert_cmd. Nothing here needs a reachable
//! SSH server: connection attempts target a closed local port.

use assert_cmd::Command;
use predicates::prelude::*;

fn flock() -> Command {
    let mut cmd = Command::cargo_bin("flock")
        .expect("Failed to locate flock binary - ensure it's built before running tests");
    cmd.env_remove("FLOCK_PASSWORD");
    cmd
}

#[test]
fn test_cli_help() {
    flock()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("flock"))
        .stdout(predicate::str::contains("fleet of SSH hosts"));
}

#[test]
fn test_cli_version() {
    flock()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("flock"));
}

#[test]
fn test_cli_subcommand_help() {
    for (sub, expected) in [
        ("ping", "reached"),
        ("exec", "--log-to-file"),
        ("push", "--no-overwrite"),
        ("pull", "--exact"),
    ] {
        flock()
            .args([sub, "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains(expected));
    }
}

#[test]
fn test_cli_requires_password() {
    flock()
        .args(["ping", "web1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--password"));
}

#[test]
fn test_cli_requires_hosts() {
    flock()
        .args(["ping", "--password", "pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No hosts given"));
}

#[test]
fn test_cli_exec_requires_command() {
    flock()
        .args(["exec", "web1", "--password", "pw"])
        .assert()
        .failure();
}

#[test]
fn test_cli_missing_inventory() {
    let dir = tempfile::tempdir().unwrap();
    flock()
        .args(["ping", "--password", "pw", "--inventory"])
        .arg(dir.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read inventory"));
}

#[test]
fn test_cli_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    flock()
        .args(["ping", "web1", "--password", "pw", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure();
}

#[test]
fn test_cli_ping_unreachable_host() {
    flock()
        .args(["ping", "127.0.0.1:1", "--password", "pw", "--timeout", "5"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unreachable"));
}

#[test]
fn test_cli_ping_accepts_user() {
    flock()
        .args(["ping", "127.0.0.1:1", "--password", "pw", "--user", "admin"])
        .args(["--timeout", "5"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unreachable"));
}

#[test]
fn test_cli_ping_from_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let inventory = dir.path().join("hosts");
    std::fs::write(&inventory, "# nothing listens here\n127.0.0.1:1\n").unwrap();

    flock()
        .args(["ping", "--password", "pw", "--timeout", "5", "--inventory"])
        .arg(&inventory)
        .assert()
        .failure()
        .stdout(predicate::str::contains("127.0.0.1:1"));
}

#[test]
fn test_cli_exec_unreachable_fails() {
    flock()
        .args(["exec", "127.0.0.1:1", "--timeout", "5", "--", "uptime"])
        .env("FLOCK_PASSWORD", "pw")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not connect to 127.0.0.1:1"));
}
