//! Length-prefixed framing
//!
//! Each frame is a 4-byte big-endian payload length followed by exactly that
//! many payload bytes. The decoder buffers until a whole frame is present, so
//! payloads never come out partial no matter how reads are split.

use bytes::{Buf, BufMut, BytesMut};
use netlog_core::{Error, Result, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_LEN};
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, Encoder, FramedRead};
use tracing::trace;

/// Codec for length-prefixed frames
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Reject frames whose declared length exceeds `max_frame_len`
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    fn peek_len(src: &BytesMut) -> usize {
        u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>> {
        if src.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let len = Self::peek_len(src);
        if len > self.max_frame_len {
            return Err(Error::FrameTooLarge {
                len,
                max: self.max_frame_len,
            });
        }

        let total = FRAME_HEADER_LEN + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_LEN);
        trace!("Decoded frame of {} bytes", len);
        Ok(Some(src.split_to(len)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        if src.len() < FRAME_HEADER_LEN {
            // Closed at a frame boundary (or inside the length prefix)
            src.clear();
            return Ok(None);
        }

        let expected = Self::peek_len(src);
        let received = src.len() - FRAME_HEADER_LEN;
        src.clear();
        Err(Error::TruncatedFrame { expected, received })
    }
}

impl<'a> Encoder<&'a [u8]> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, payload: &'a [u8], dst: &mut BytesMut) -> Result<()> {
        if payload.len() > self.max_frame_len || payload.len() > u32::MAX as usize {
            return Err(Error::FrameTooLarge {
                len: payload.len(),
                max: self.max_frame_len.min(u32::MAX as usize),
            });
        }

        dst.reserve(FRAME_HEADER_LEN + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.put_slice(payload);
        Ok(())
    }
}

/// Lazy stream of payloads read from `reader`.
///
/// Ends cleanly when the peer closes at a frame boundary; yields one
/// `TruncatedFrame` error and ends if it closes mid-payload.
pub fn frames<R: AsyncRead>(reader: R, max_frame_len: usize) -> FramedRead<R, FrameCodec> {
    FramedRead::new(reader, FrameCodec::with_max_frame_len(max_frame_len))
}
