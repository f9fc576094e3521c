//! Line writers: rotating file and console

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::rotation::RotationConfig;

/// A destination that accepts whole rendered lines
pub trait LineWriter: Send {
    /// Write one line; the writer appends the newline
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Human-readable name used in errors and logs
    fn describe(&self) -> String;
}

/// File writer with size-based rotation and bounded backups
pub struct RotatingFileWriter {
    path: PathBuf,
    /// `None` after a failed write or rotation; reopened on the next write
    file: Option<File>,
    config: RotationConfig,
    current_size: u64,
}

impl RotatingFileWriter {
    /// Open (or create) the active file in append mode
    pub fn new(path: PathBuf, config: RotationConfig) -> io::Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = Self {
            path,
            file: None,
            config,
            current_size: 0,
        };
        writer.open()?;
        Ok(writer)
    }

    fn open(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        self.current_size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    /// Close the active file, shift the backups up by one and start a fresh
    /// active file. The backup past `backup_count` is overwritten.
    fn rotate(&mut self) -> io::Result<()> {
        debug!("Rotating log file: {}", self.path.display());

        self.file = None;

        // .2 -> .3, .1 -> .2, ...
        for i in (1..self.config.backup_count).rev() {
            let src = rotated_path(&self.path, i);
            if src.exists() {
                let dst = rotated_path(&self.path, i + 1);
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
                fs::rename(&src, &dst)?;
            }
        }

        let first = rotated_path(&self.path, 1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        if self.path.exists() {
            fs::rename(&self.path, &first)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;

        self.file = Some(file);
        self.current_size = 0;

        info!("Rotated {}", self.path.display());
        Ok(())
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get current file size
    pub fn current_size(&self) -> u64 {
        self.current_size
    }
}

impl LineWriter for RotatingFileWriter {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.file.is_none() {
            self.open()?;
        }

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let pending = buf.len() as u64;
        if self.config.should_rotate(self.current_size, pending) {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file is not open"))?;

        // A partial write leaves the size unknown: drop the handle so the
        // next write reopens and re-reads it
        if let Err(e) = file.write_all(&buf) {
            self.file = None;
            return Err(e);
        }
        self.current_size += pending;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Unbuffered writer to stderr
#[derive(Debug, Default)]
pub struct ConsoleWriter;

impl ConsoleWriter {
    pub fn new() -> Self {
        Self
    }
}

impl LineWriter for ConsoleWriter {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{}", line)?;
        stderr.flush()
    }

    fn describe(&self) -> String {
        "console".to_string()
    }
}

/// Get the path for a rotated log file
pub fn rotated_path(base: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}
