//! netlog Proto - Framing, record encoding, and the forwarding client

pub mod client;
pub mod codec;
pub mod record;

pub use client::{Delivery, Forwarder};
pub use codec::{frames, FrameCodec};
pub use record::{decode_record, encode_record, materialize};
