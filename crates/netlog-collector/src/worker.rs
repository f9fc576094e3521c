//! Connection worker - decodes one producer's stream into the sink

use futures::StreamExt;
use netlog_core::Result;
use netlog_proto::{frames, materialize};
use netlog_sink::LogSink;
use tokio::io::AsyncRead;
use tracing::{trace, warn};

/// Read frames from `reader` until the peer closes, emitting each record.
///
/// Returns the number of records written. Protocol errors (truncated or
/// oversized frame, malformed record) and read errors end the connection and
/// are returned. A sink failure only drops that record.
pub async fn serve_connection<R>(
    reader: R,
    peer: &str,
    sink: &LogSink,
    max_frame_len: usize,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut frames = frames(reader, max_frame_len);
    let mut emitted = 0u64;

    while let Some(frame) = frames.next().await {
        let payload = frame?;
        let record = materialize(&payload, peer)?;
        trace!("Record from {}: {} {}", peer, record.logger_name, record.level);

        match sink.emit(&record) {
            Ok(()) => emitted += 1,
            Err(e) => warn!("Dropped record from {}: {}", peer, e),
        }
    }

    Ok(emitted)
}
