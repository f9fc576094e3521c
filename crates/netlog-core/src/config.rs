//! Collector configuration
//!
//! Settings can come from a config file in any of these formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)
//!
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Destination for records whose logger name falls under a route prefix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// File name, relative to the log folder unless absolute
    pub file: Option<String>,
    /// Write to the console instead of a file
    pub console: bool,
}

/// Collector settings (netlogd.toml/yaml/json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the log files
    pub folder: PathBuf,
    /// File-name stem of the active log file
    pub suffix: String,
    /// Log to the console instead of the rotating file
    pub console: bool,
    /// Rotation threshold, 0 disables rotation
    pub max_bytes: u64,
    /// Number of rotated backups to keep
    pub backup_count: usize,
    /// Accept loop poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Route every record by this name instead of its own logger name
    pub logname: Option<String>,
    /// Largest accepted frame payload
    pub max_frame_len: usize,
    /// Extra destinations keyed by logger name prefix
    pub routes: BTreeMap<String, RouteConfig>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            folder: PathBuf::new(),
            suffix: DEFAULT_SUFFIX.to_string(),
            console: false,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            logname: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            routes: BTreeMap::new(),
        }
    }
}

impl CollectorConfig {
    /// Create a config with defaults writing into `folder`
    pub fn new<P: Into<PathBuf>>(folder: P) -> Self {
        Self {
            folder: folder.into(),
            ..Self::default()
        }
    }

    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: CollectorConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// Find a config file in a directory, if there is one
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Check settings that would otherwise fail later at startup
    pub fn validate(&self) -> Result<()> {
        if self.folder.as_os_str().is_empty() {
            return Err(Error::config("Log folder is required"));
        }
        if self.suffix.is_empty() {
            return Err(Error::config("File suffix must not be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config("Poll interval must be greater than zero"));
        }
        if self.max_frame_len == 0 {
            return Err(Error::config("Max frame length must be greater than zero"));
        }
        for (prefix, route) in &self.routes {
            if prefix.is_empty() {
                return Err(Error::config("Route prefix must not be empty"));
            }
            match (&route.file, route.console) {
                (Some(_), true) => {
                    return Err(Error::config(format!(
                        "Route '{}' sets both file and console",
                        prefix
                    )))
                }
                (None, false) => {
                    return Err(Error::config(format!(
                        "Route '{}' needs a file or console = true",
                        prefix
                    )))
                }
                (Some(file), false) if file.is_empty() => {
                    return Err(Error::config(format!("Route '{}' has an empty file", prefix)))
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Path of the active log file
    pub fn log_path(&self) -> PathBuf {
        log_path(&self.folder, &self.suffix)
    }

    /// Resolve a route file against the log folder
    pub fn route_path(&self, file: &str) -> PathBuf {
        let p = Path::new(file);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.folder.join(p)
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
