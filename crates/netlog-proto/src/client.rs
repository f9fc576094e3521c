//! Forwarding client - sends records to a collector over TCP

use futures::SinkExt;
use netlog_core::{constants, Error, LogRecord, Result};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};

use crate::codec::FrameCodec;
use crate::record::encode_record;

/// Outcome of handing a record to the forwarder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No connection was available; the record is gone
    Dropped,
}

/// Delay before the next reconnect attempt after one more failure
fn next_retry_delay(current: Option<Duration>) -> Duration {
    match current {
        None => constants::RETRY_START,
        Some(d) => (d * constants::RETRY_FACTOR).min(constants::RETRY_MAX),
    }
}

/// Client that frames records and writes them to a collector.
///
/// Delivery is best effort. When the collector is unreachable the record is
/// dropped and reconnects are spaced out with exponential backoff.
pub struct Forwarder {
    addr: String,
    conn: Option<FramedWrite<TcpStream, FrameCodec>>,
    retry_at: Option<Instant>,
    retry_delay: Option<Duration>,
}

impl Forwarder {
    /// Create a forwarder for `host:port` (does not connect yet)
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
            conn: None,
            retry_at: None,
            retry_delay: None,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Connect to the collector now, ignoring any pending backoff
    pub async fn connect(&mut self) -> Result<()> {
        match TcpStream::connect(&self.addr).await {
            Ok(stream) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("Failed to set TCP_NODELAY: {}", e);
                }
                info!("Connected to collector at {}", self.addr);
                self.conn = Some(FramedWrite::new(stream, FrameCodec::new()));
                self.retry_at = None;
                self.retry_delay = None;
                Ok(())
            }
            Err(e) => {
                let delay = next_retry_delay(self.retry_delay);
                self.retry_delay = Some(delay);
                self.retry_at = Some(Instant::now() + delay);
                Err(Error::ConnectionFailed(format!("{}: {}", self.addr, e)))
            }
        }
    }

    /// Connect unless a backoff window is still open
    async fn ensure_connected(&mut self) -> bool {
        if self.conn.is_some() {
            return true;
        }
        if let Some(at) = self.retry_at {
            if Instant::now() < at {
                return false;
            }
        }
        match self.connect().await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}, retrying in {:?}", e, self.retry_delay.unwrap_or_default());
                false
            }
        }
    }

    /// Send one record.
    ///
    /// Network failures drop the record and return `Delivery::Dropped`;
    /// only encoding failures are errors.
    pub async fn send(&mut self, record: &LogRecord) -> Result<Delivery> {
        let payload = encode_record(record)?;

        if !self.ensure_connected().await {
            return Ok(Delivery::Dropped);
        }

        let Some(conn) = self.conn.as_mut() else {
            return Ok(Delivery::Dropped);
        };

        match conn.send(payload.as_slice()).await {
            Ok(()) => Ok(Delivery::Sent),
            Err(e @ Error::FrameTooLarge { .. }) => Err(e),
            Err(e) => {
                warn!("Send to {} failed: {}", self.addr, e);
                self.conn = None;
                Ok(Delivery::Dropped)
            }
        }
    }

    /// Flush pending frames and close the connection
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            conn.close().await?;
            debug!("Closed connection to {}", self.addr);
        }
        Ok(())
    }
}
