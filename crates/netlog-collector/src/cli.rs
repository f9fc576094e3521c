//! CLI argument definitions

use clap::Parser;
use netlog_core::{CollectorConfig, Result};
use std::path::PathBuf;

/// Unset options fall back to the config file, then to built-in defaults
#[derive(Parser, Debug)]
#[command(name = "netlogd")]
#[command(version, about = "Collect log records sent over TCP into rotating files")]
pub struct Cli {
    /// Folder to store log files in (created if missing)
    #[arg(short, long)]
    pub folder: Option<PathBuf>,

    /// Port to listen on [default: 9020]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Log file name stem; records go to <folder>/<suffix>.log [default: net_logger]
    #[arg(short, long)]
    pub suffix: Option<String>,

    /// Write records to the console instead of a file
    #[arg(long, alias = "stdout")]
    pub console: bool,

    /// Rotate the log file once it would grow past this size [default: 100000000]
    #[arg(long = "max-bytes")]
    pub max_bytes: Option<u64>,

    /// Number of rotated files to keep [default: 10]
    #[arg(long)]
    pub count: Option<usize>,

    /// Route every record as if it came from this logger name
    #[arg(long)]
    pub logname: Option<String>,

    /// Config file (TOML, YAML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Merge the config file (explicit, or found in the folder) with the flags
    pub fn into_config(self) -> Result<CollectorConfig> {
        let file = match (&self.config, &self.folder) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(folder)) => CollectorConfig::find_in(folder),
            (None, None) => None,
        };

        let mut config = match file {
            Some(path) => CollectorConfig::load(&path)?,
            None => CollectorConfig::default(),
        };

        if let Some(folder) = self.folder {
            config.folder = folder;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(suffix) = self.suffix {
            config.suffix = suffix;
        }
        if self.console {
            config.console = true;
        }
        if let Some(max_bytes) = self.max_bytes {
            config.max_bytes = max_bytes;
        }
        if let Some(count) = self.count {
            config.backup_count = count;
        }
        if self.logname.is_some() {
            config.logname = self.logname;
        }

        config.validate()?;
        Ok(config)
    }
}
