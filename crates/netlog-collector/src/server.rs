//! Collector server - accepts producer connections and hands them to workers

use netlog_core::{constants, CollectorConfig, Error, Result};
use netlog_sink::LogSink;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, TcpListener, TcpSocket};
use tracing::{debug, info, warn};

use crate::worker::serve_connection;

const LISTEN_BACKLOG: u32 = 1024;

/// Cloneable control surface for a running collector
#[derive(Debug, Clone, Default)]
pub struct CollectorHandle {
    abort: Arc<AtomicBool>,
    accepted: Arc<AtomicU64>,
    active: Arc<AtomicUsize>,
}

impl CollectorHandle {
    /// Ask the accept loop to stop. Takes effect within one poll interval;
    /// connections already accepted keep running.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Connections accepted so far
    pub fn accepted_connections(&self) -> u64 {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Number of connection workers still running
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Decrements the active worker count when the worker task ends
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    /// Longest the accept loop waits before re-checking the abort flag
    pub poll_interval: Duration,
    pub max_frame_len: usize,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(constants::DEFAULT_POLL_INTERVAL_MS),
            max_frame_len: constants::DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl From<&CollectorConfig> for ServeOptions {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_frame_len: config.max_frame_len,
        }
    }
}

fn bind_failure(addr: &str, source: io::Error) -> Error {
    Error::BindFailure {
        addr: addr.to_string(),
        source,
    }
}

/// TCP collector: one worker task per accepted connection, all writing
/// into a shared sink.
pub struct Collector {
    listener: TcpListener,
    sink: Arc<LogSink>,
    options: ServeOptions,
    handle: CollectorHandle,
}

impl Collector {
    /// Bind a listening socket with address reuse enabled
    pub async fn bind(addr: &str, sink: Arc<LogSink>, options: ServeOptions) -> Result<Self> {
        let resolved = lookup_host(addr)
            .await
            .map_err(|e| bind_failure(addr, e))?
            .next()
            .ok_or_else(|| {
                bind_failure(
                    addr,
                    io::Error::new(io::ErrorKind::AddrNotAvailable, "no address resolved"),
                )
            })?;

        let listener = Self::listen(resolved).map_err(|e| bind_failure(addr, e))?;
        info!("Collector listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            sink,
            options,
            handle: CollectorHandle::default(),
        })
    }

    fn listen(addr: SocketAddr) -> io::Result<TcpListener> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        socket.listen(LISTEN_BACKLOG)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> CollectorHandle {
        self.handle.clone()
    }

    /// Accept connections until the handle is aborted.
    ///
    /// Returns the number of connections accepted. The listener is closed on
    /// return; workers that are still running finish on their own.
    pub async fn serve_until_stopped(self) -> Result<u64> {
        let Self {
            listener,
            sink,
            options,
            handle,
        } = self;

        info!("Collector state: Listening");

        while !handle.is_aborted() {
            let (stream, peer) =
                match tokio::time::timeout(options.poll_interval, listener.accept()).await {
                    Err(_) => continue,
                    Ok(Ok(conn)) => conn,
                    Ok(Err(e)) => {
                        warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(constants::ACCEPT_ERROR_PAUSE).await;
                        continue;
                    }
                };

            let guard = ActiveGuard::new(&handle.active);
            handle.accepted.fetch_add(1, Ordering::SeqCst);
            debug!("Accepted connection from {}", peer);

            let sink = Arc::clone(&sink);
            let max_frame_len = options.max_frame_len;

            tokio::spawn(async move {
                let _guard = guard;
                let peer = peer.to_string();
                match serve_connection(stream, &peer, &sink, max_frame_len).await {
                    Ok(count) => debug!("{} closed after {} records", peer, count),
                    Err(e) if e.is_protocol_error() => {
                        warn!("Dropping connection from {}: {}", peer, e)
                    }
                    Err(e) => warn!("Connection from {} failed: {}", peer, e),
                }
            });
        }

        info!("Collector state: Stopping");
        drop(listener);
        let accepted = handle.accepted_connections();
        info!(
            "Collector state: Stopped ({} accepted, {} still active)",
            accepted,
            handle.active_connections()
        );

        Ok(accepted)
    }
}
