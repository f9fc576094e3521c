//! Error types for netlog

use std::path::PathBuf;

/// netlog error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Peer closed the connection in the middle of a frame payload
    #[error("Truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame { expected: usize, received: usize },

    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Sink write failed on {destination}: {source}")]
    SinkWriteFailure {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    BindFailure {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for netlog
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedRecord(msg.into())
    }

    pub fn sink_write<S: Into<String>>(destination: S, source: std::io::Error) -> Self {
        Error::SinkWriteFailure {
            destination: destination.into(),
            source,
        }
    }

    /// Errors that end a single connection without affecting the server
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Error::TruncatedFrame { .. } | Error::FrameTooLarge { .. } | Error::MalformedRecord(_)
        )
    }
}
