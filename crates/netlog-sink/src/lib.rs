//! netlog Sink - Record rendering, routing, and rotating file output

mod rotation;
mod sink;
mod writer;

pub use rotation::RotationConfig;
pub use sink::{format_record, Destination, LogSink};
pub use writer::{rotated_path, ConsoleWriter, LineWriter, RotatingFileWriter};
