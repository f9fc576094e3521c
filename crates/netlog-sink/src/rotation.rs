//! Log rotation configuration

use netlog_core::constants;

/// Log rotation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationConfig {
    /// Rotate once the active file would grow past this many bytes
    pub max_bytes: u64,
    /// Maximum number of rotated files to keep
    pub backup_count: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_bytes: constants::DEFAULT_MAX_BYTES,
            backup_count: constants::DEFAULT_BACKUP_COUNT,
        }
    }
}

impl RotationConfig {
    pub fn new(max_bytes: u64, backup_count: usize) -> Self {
        Self {
            max_bytes,
            backup_count,
        }
    }

    /// Rotation needs both a threshold and somewhere to put backups
    pub fn is_enabled(&self) -> bool {
        self.max_bytes > 0 && self.backup_count > 0
    }

    /// Whether writing `pending` more bytes onto a file of `current` bytes
    /// should rotate first. An empty file is never rotated.
    pub fn should_rotate(&self, current: u64, pending: u64) -> bool {
        self.is_enabled() && current > 0 && current.saturating_add(pending) > self.max_bytes
    }
}
