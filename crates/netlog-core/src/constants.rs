//! Constants and default values for netlog

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default collector port
pub const DEFAULT_PORT: u16 = 9020;

/// Default collector bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default file-name stem for the active log file
pub const DEFAULT_SUFFIX: &str = "net_logger";

/// Extension appended to the file-name stem
pub const LOG_EXTENSION: &str = "log";

/// Default rotation threshold in bytes
pub const DEFAULT_MAX_BYTES: u64 = 100_000_000;

/// Default number of rotated backups to keep
pub const DEFAULT_BACKUP_COUNT: usize = 10;

/// Default accept poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Size of the frame length prefix
pub const FRAME_HEADER_LEN: usize = 4;

/// Default maximum frame payload (16MB)
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Pause after a failed accept before polling again
pub const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Forwarder reconnect backoff: first delay
pub const RETRY_START: Duration = Duration::from_secs(1);

/// Forwarder reconnect backoff: multiplier per failure
pub const RETRY_FACTOR: u32 = 2;

/// Forwarder reconnect backoff: upper bound
pub const RETRY_MAX: Duration = Duration::from_secs(30);

/// Logger name used when a producer does not pick one
pub const ROOT_LOGGER: &str = "root";

/// Config file names looked up in the log folder (in priority order)
pub const CONFIG_FILES: &[&str] = &["netlogd.toml", "netlogd.yaml", "netlogd.yml", "netlogd.json"];

/// Get the active log file path inside a folder
pub fn log_path(folder: &Path, suffix: &str) -> PathBuf {
    folder.join(format!("{}.{}", suffix, LOG_EXTENSION))
}
