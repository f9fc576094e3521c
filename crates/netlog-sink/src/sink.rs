//! Shared log sink: routes records to destinations and renders them

use chrono::Local;
use netlog_core::{CollectorConfig, Error, LogRecord, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::rotation::RotationConfig;
use crate::writer::{ConsoleWriter, LineWriter, RotatingFileWriter};

/// Render a record as `<timestamp> <logger> <level> <message>`
pub fn format_record(record: &LogRecord) -> String {
    format!(
        "{} {} {} {}",
        record
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S,%3f"),
        record.logger_name,
        record.level,
        record.message
    )
}

/// One output guarded by its own lock.
///
/// Rotation happens inside `write_line`, so a write and any rotation it
/// triggers form one critical section.
pub struct Destination {
    label: String,
    writer: Mutex<Box<dyn LineWriter>>,
}

impl Destination {
    pub fn new<W: LineWriter + 'static>(writer: W) -> Self {
        Self {
            label: writer.describe(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn console() -> Self {
        Self::new(ConsoleWriter::new())
    }

    pub fn file(path: PathBuf, rotation: RotationConfig) -> Result<Self> {
        let label = path.display().to_string();
        let writer = RotatingFileWriter::new(path, rotation).map_err(|e| Error::sink_write(label, e))?;
        Ok(Self::new(writer))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn write_line(&self, line: &str) -> Result<()> {
        self.writer
            .lock()
            .write_line(line)
            .map_err(|e| Error::sink_write(self.label.clone(), e))
    }
}

/// Process-wide sink shared by every connection worker.
///
/// Records are routed by logger name (or by the fixed name, when one is
/// set) to the destination of the nearest configured dotted ancestor, then
/// to the root destination. Every record is written whatever its level.
pub struct LogSink {
    root: Arc<Destination>,
    routes: HashMap<String, Arc<Destination>>,
    fixed_name: Option<String>,
}

impl LogSink {
    pub fn new(root: Destination) -> Self {
        Self {
            root: Arc::new(root),
            routes: HashMap::new(),
            fixed_name: None,
        }
    }

    /// Route every record as if it came from `name`
    pub fn with_fixed_name<S: Into<String>>(mut self, name: S) -> Self {
        self.fixed_name = Some(name.into());
        self
    }

    /// Send records under `prefix` (and its dotted descendants) to `destination`
    pub fn with_route<S: Into<String>>(self, prefix: S, destination: Destination) -> Self {
        self.with_shared_route(prefix, Arc::new(destination))
    }

    fn with_shared_route<S: Into<String>>(mut self, prefix: S, destination: Arc<Destination>) -> Self {
        self.routes.insert(prefix.into(), destination);
        self
    }

    /// Build the sink described by a collector config
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        let rotation = RotationConfig::new(config.max_bytes, config.backup_count);

        // Routes pointing at the same file must share one writer
        let mut files: HashMap<PathBuf, Arc<Destination>> = HashMap::new();
        let console = Arc::new(Destination::console());

        let root = if config.console {
            Arc::clone(&console)
        } else {
            let path = config.log_path();
            let dest = Arc::new(Destination::file(path.clone(), rotation)?);
            files.insert(path, Arc::clone(&dest));
            dest
        };
        info!("Root sink: {}", root.label());

        let mut sink = Self {
            root,
            routes: HashMap::new(),
            fixed_name: config.logname.clone(),
        };

        for (prefix, route) in &config.routes {
            let dest = match &route.file {
                Some(file) if !route.console => {
                    let path = config.route_path(file);
                    match files.get(&path) {
                        Some(existing) => Arc::clone(existing),
                        None => {
                            let dest = Arc::new(Destination::file(path.clone(), rotation)?);
                            files.insert(path, Arc::clone(&dest));
                            dest
                        }
                    }
                }
                _ => Arc::clone(&console),
            };
            info!("Route '{}' -> {}", prefix, dest.label());
            sink = sink.with_shared_route(prefix.clone(), dest);
        }

        Ok(sink)
    }

    /// Destination for a logger name
    fn resolve(&self, name: &str) -> &Arc<Destination> {
        let mut candidate = name;
        loop {
            if let Some(dest) = self.routes.get(candidate) {
                return dest;
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => return &self.root,
            }
        }
    }

    /// Label of the destination a record from `logger_name` ends up in
    pub fn destination_for(&self, logger_name: &str) -> &str {
        let name = self.fixed_name.as_deref().unwrap_or(logger_name);
        self.resolve(name).label()
    }

    /// Render and write one record
    pub fn emit(&self, record: &LogRecord) -> Result<()> {
        let name = self.fixed_name.as_deref().unwrap_or(&record.logger_name);
        let line = format_record(record);
        self.resolve(name).write_line(&line)
    }
}
