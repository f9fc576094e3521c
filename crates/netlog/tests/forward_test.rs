use assert_cmd::Command;
use netlog_collector::{Collector, ServeOptions};
use netlog_sink::{Destination, LogSink, RotationConfig};
use predicates::prelude::*;
use std::fs;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_ip_fails() {
    Command::cargo_bin("netlog")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--ip"));
}

#[test]
fn test_unknown_level_rejected() {
    Command::cargo_bin("netlog")
        .unwrap()
        .args(["--ip", "127.0.0.1", "--level", "LOUD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown level"));
}

#[test]
fn test_unreachable_collector_drops_lines() {
    // Grab a free port, then release it so nothing listens there
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    Command::cargo_bin("netlog")
        .unwrap()
        .args(["--ip", "127.0.0.1", "--port", &port.to_string(), "--json"])
        .write_stdin("one\ntwo\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("\"dropped\":3"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stdin_lines_reach_collector() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("net_logger.log");
    let sink = Arc::new(LogSink::new(
        Destination::file(path.clone(), RotationConfig::default()).unwrap(),
    ));
    let options = ServeOptions {
        poll_interval: Duration::from_millis(50),
        ..ServeOptions::default()
    };
    let collector = Collector::bind("127.0.0.1:0", sink, options).await.unwrap();
    let port = collector.local_addr().unwrap().port();
    let handle = collector.handle();
    let server = tokio::spawn(collector.serve_until_stopped());

    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("netlog")
            .unwrap()
            .args(["--ip", "127.0.0.1", "--port", &port.to_string()])
            .args(["--name", "bbb.serial", "--level", "WARNING"])
            .write_stdin("temp 41.5   \nfan on\n")
            .assert()
            .success()
            .stderr(predicate::str::contains("3 records sent"));
    })
    .await
    .unwrap();

    while handle.accepted_connections() < 1 || handle.active_connections() > 0 {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.abort();
    server.await.unwrap().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("Network logging enable 127.0.0.1."));
    assert!(lines[0].contains(" bbb.serial WARNING 127.0.0.1:"));
    assert!(lines[1].ends_with(" temp 41.5"));
    assert!(lines[2].ends_with(" fan on"));
}
