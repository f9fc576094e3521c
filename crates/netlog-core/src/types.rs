//! Core types for netlog

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Record severity.
///
/// Ordered by numeric value. The standard levels have names; any other value
/// is a custom level and renders as `Level N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(pub u32);

impl Level {
    pub const NOTSET: Level = Level(0);
    pub const DEBUG: Level = Level(10);
    pub const INFO: Level = Level(20);
    pub const WARNING: Level = Level(30);
    pub const ERROR: Level = Level(40);
    pub const CRITICAL: Level = Level(50);

    /// Numeric value of the level
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Name of a standard level
    pub fn name(&self) -> Option<&'static str> {
        match self.0 {
            0 => Some("NOTSET"),
            10 => Some("DEBUG"),
            20 => Some("INFO"),
            30 => Some("WARNING"),
            40 => Some("ERROR"),
            50 => Some("CRITICAL"),
            _ => None,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "Level {}", self.0),
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_uppercase().as_str() {
            "NOTSET" => Ok(Level::NOTSET),
            "DEBUG" => Ok(Level::DEBUG),
            "INFO" => Ok(Level::INFO),
            "WARNING" | "WARN" => Ok(Level::WARNING),
            "ERROR" => Ok(Level::ERROR),
            "CRITICAL" | "FATAL" => Ok(Level::CRITICAL),
            other => {
                // "Level 25" is how custom levels render, accept it back
                let digits = other.strip_prefix("LEVEL ").unwrap_or(other);
                digits
                    .trim()
                    .parse::<u32>()
                    .map(Level)
                    .map_err(|_| Error::malformed(format!("Unknown level: {}", s)))
            }
        }
    }
}

/// Scalar attribute value carried alongside a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// A structured log event
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Producer-side creation time
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    /// Dotted, hierarchical source name
    pub logger_name: String,
    pub message: String,
    /// Extra fields, passed through untouched
    pub attributes: BTreeMap<String, AttrValue>,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    ///
    /// The timestamp is truncated to microseconds, the precision the wire
    /// format carries.
    pub fn new<N: Into<String>, M: Into<String>>(logger_name: N, level: Level, message: M) -> Self {
        Self {
            timestamp: Utc::now().trunc_subsecs(6),
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_attribute<K: Into<String>, V: Into<AttrValue>>(mut self, key: K, value: V) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
