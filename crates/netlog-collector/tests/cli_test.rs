use assert_cmd::Command;
use predicates::prelude::*;
use std::net::TcpListener;
use tempfile::TempDir;

#[test]
fn test_help_lists_options() {
    Command::cargo_bin("netlogd")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--folder"))
        .stdout(predicate::str::contains("--max-bytes"))
        .stdout(predicate::str::contains("--logname"));
}

#[test]
fn test_missing_folder_fails() {
    Command::cargo_bin("netlogd")
        .unwrap()
        .args(["--port", "0"])
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Log folder is required"));
}

#[test]
fn test_port_in_use_fails() {
    let dir = TempDir::new().unwrap();
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port().to_string();

    Command::cargo_bin("netlogd")
        .unwrap()
        .args(["--host", "127.0.0.1", "--port", &port, "--folder"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to bind"));
}
