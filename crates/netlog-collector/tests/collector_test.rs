//! End-to-end tests: real TCP producers against a running collector

use futures::SinkExt;
use netlog_collector::{Collector, CollectorHandle, ServeOptions};
use netlog_core::{Level, LogRecord};
use netlog_proto::{encode_record, FrameCodec};
use netlog_sink::{Destination, LineWriter, LogSink, RotationConfig};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedWrite;

struct Running {
    addr: SocketAddr,
    handle: CollectorHandle,
    server: JoinHandle<netlog_core::Result<u64>>,
}

async fn start(path: &Path, rotation: RotationConfig) -> Running {
    let dest = Destination::file(path.to_path_buf(), rotation).unwrap();
    start_with(dest).await
}

async fn start_with(dest: Destination) -> Running {
    let sink = Arc::new(LogSink::new(dest));
    let options = ServeOptions {
        poll_interval: Duration::from_millis(50),
        ..ServeOptions::default()
    };
    let collector = Collector::bind("127.0.0.1:0", sink, options).await.unwrap();
    Running {
        addr: collector.local_addr().unwrap(),
        handle: collector.handle(),
        server: tokio::spawn(collector.serve_until_stopped()),
    }
}

impl Running {
    /// Wait until `connections` have been accepted and served, then stop
    async fn drain_and_stop(self, connections: u64) {
        while self.handle.accepted_connections() < connections
            || self.handle.active_connections() > 0
        {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.handle.abort();
        let accepted = self.server.await.unwrap().unwrap();
        assert_eq!(accepted, connections);
    }
}

/// In-memory destination that rejects any line mentioning `reject`
struct RejectingWriter {
    lines: Arc<Mutex<Vec<String>>>,
    reject: &'static str,
}

impl LineWriter for RejectingWriter {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if line.contains(self.reject) {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left"));
        }
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

fn payload(name: &str, msg: &str) -> Vec<u8> {
    encode_record(&LogRecord::new(name, Level::INFO, msg)).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_producers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("net_logger.log");
    let running = start(&path, RotationConfig::default()).await;

    let producers: Vec<_> = (0..50)
        .map(|c| {
            let addr = running.addr;
            tokio::spawn(async move {
                let stream = TcpStream::connect(addr).await.unwrap();
                let local = stream.local_addr().unwrap();
                let mut conn = FramedWrite::new(stream, FrameCodec::new());
                for i in 0..100 {
                    let body = payload("bench", &format!("c{} n{}", c, i));
                    conn.send(body.as_slice()).await.unwrap();
                }
                conn.close().await.unwrap();
                (c, local)
            })
        })
        .collect();

    let mut peers = Vec::new();
    for p in producers {
        peers.push(p.await.unwrap());
    }
    running.drain_and_stop(50).await;

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 5000);

    for (c, local) in peers {
        let tag = format!(" bench INFO {} c{} n", local, c);
        let mine: Vec<&str> = lines.iter().copied().filter(|l| l.contains(&tag)).collect();
        assert_eq!(mine.len(), 100, "connection {} ({})", c, local);
        // Order within one connection is preserved
        for (i, line) in mine.iter().enumerate() {
            assert!(line.ends_with(&format!("c{} n{}", c, i)), "out of order: {}", line);
        }
    }
}

#[tokio::test]
async fn test_truncated_frame_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("net_logger.log");
    let running = start(&path, RotationConfig::default()).await;

    let mut stream = TcpStream::connect(running.addr).await.unwrap();
    let mut wire = 100u32.to_be_bytes().to_vec();
    wire.extend_from_slice(&[b'{'; 40]);
    stream.write_all(&wire).await.unwrap();
    stream.shutdown().await.unwrap();
    drop(stream);

    running.drain_and_stop(1).await;
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[tokio::test]
async fn test_malformed_connection_does_not_affect_others() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("net_logger.log");
    let running = start(&path, RotationConfig::default()).await;

    let mut bad = TcpStream::connect(running.addr).await.unwrap();
    let mut good = FramedWrite::new(
        TcpStream::connect(running.addr).await.unwrap(),
        FrameCodec::new(),
    );

    let mut wire = frame(&payload("bad", "first"));
    wire.extend(frame(b"{\"name\": \"bad\"}"));
    wire.extend(frame(&payload("bad", "unreachable")));
    bad.write_all(&wire).await.unwrap();

    for i in 0..10 {
        good.send(payload("good", &format!("m{}", i)).as_slice())
            .await
            .unwrap();
    }
    good.close().await.unwrap();
    // The collector may already have reset this connection
    let _ = bad.shutdown().await;
    drop(bad);

    running.drain_and_stop(2).await;

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().filter(|l| l.contains(" good INFO ")).count(), 10);
    assert!(content.contains("first"));
    assert!(!content.contains("unreachable"));
}

#[tokio::test]
async fn test_sink_failure_does_not_affect_other_connections() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let running = start_with(Destination::new(RejectingWriter {
        lines: Arc::clone(&lines),
        reject: "unwritable",
    }))
    .await;

    let mut failing = FramedWrite::new(
        TcpStream::connect(running.addr).await.unwrap(),
        FrameCodec::new(),
    );
    let mut healthy = FramedWrite::new(
        TcpStream::connect(running.addr).await.unwrap(),
        FrameCodec::new(),
    );

    for msg in ["a0", "unwritable", "a2"] {
        failing.send(payload("a", msg).as_slice()).await.unwrap();
    }
    for i in 0..10 {
        healthy
            .send(payload("b", &format!("b{}", i)).as_slice())
            .await
            .unwrap();
    }
    failing.close().await.unwrap();
    healthy.close().await.unwrap();

    running.drain_and_stop(2).await;

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 12);
    assert_eq!(lines.iter().filter(|l| l.contains(" b INFO ")).count(), 10);
    assert!(lines.iter().any(|l| l.ends_with(" a0")));
    assert!(lines.iter().any(|l| l.ends_with(" a2")));
    assert!(!lines.iter().any(|l| l.contains("unwritable")));
}

#[tokio::test]
async fn test_rotation_bounds_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("net_logger.log");
    let running = start(&path, RotationConfig::new(1024, 3)).await;

    let mut conn = FramedWrite::new(
        TcpStream::connect(running.addr).await.unwrap(),
        FrameCodec::new(),
    );
    for i in 0..400 {
        conn.send(payload("rot", &format!("line {:05}", i)).as_slice())
            .await
            .unwrap();
    }
    conn.close().await.unwrap();
    running.drain_and_stop(1).await;

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "net_logger.log",
            "net_logger.log.1",
            "net_logger.log.2",
            "net_logger.log.3"
        ]
    );

    let newest = fs::read_to_string(&path).unwrap();
    assert!(newest.trim_end().ends_with("line 00399"));
    for name in &names {
        let size = fs::metadata(dir.path().join(name)).unwrap().len();
        assert!(size <= 1024, "{} is {} bytes", name, size);
    }
}

#[tokio::test]
async fn test_abort_returns_within_poll_interval() {
    let dir = TempDir::new().unwrap();
    let running = start(&dir.path().join("net_logger.log"), RotationConfig::default()).await;

    let started = std::time::Instant::now();
    running.handle.abort();
    let accepted = running.server.await.unwrap().unwrap();

    assert_eq!(accepted, 0);
    assert!(started.elapsed() < Duration::from_millis(500));
}
