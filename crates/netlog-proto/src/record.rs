//! Record payload encoding
//!
//! A payload is a JSON object. `created` (epoch seconds), `name`, `msg` and a
//! level (`levelno`, or `levelname` when no number is sent) are required;
//! every other key becomes an attribute and must hold a scalar.

use chrono::{DateTime, Utc};
use netlog_core::{AttrValue, Error, Level, LogRecord, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys owned by the record itself, never treated as attributes
const RESERVED_KEYS: &[&str] = &["created", "levelno", "levelname", "name", "msg"];

#[derive(Debug, Serialize, Deserialize)]
struct WireRecord {
    created: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    levelno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    levelname: Option<String>,
    name: String,
    msg: String,
    #[serde(flatten)]
    attributes: BTreeMap<String, AttrValue>,
}

impl WireRecord {
    fn level(&self) -> Result<Level> {
        match (self.levelno, &self.levelname) {
            (Some(no), _) => Ok(Level(no)),
            (None, Some(name)) => name.parse(),
            (None, None) => Err(Error::malformed("missing field `levelno` or `levelname`")),
        }
    }
}

fn timestamp_from_secs(created: f64) -> Result<DateTime<Utc>> {
    let micros = (created * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(Error::malformed(format!("invalid `created`: {}", created)));
    }
    DateTime::from_timestamp_micros(micros as i64)
        .ok_or_else(|| Error::malformed(format!("`created` out of range: {}", created)))
}

fn timestamp_to_secs(timestamp: &DateTime<Utc>) -> f64 {
    timestamp.timestamp_micros() as f64 / 1_000_000.0
}

/// Serialize a record into a frame payload
pub fn encode_record(record: &LogRecord) -> Result<Vec<u8>> {
    let attributes = record
        .attributes
        .iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let wire = WireRecord {
        created: timestamp_to_secs(&record.timestamp),
        levelno: Some(record.level.value()),
        levelname: Some(record.level.to_string()),
        name: record.logger_name.clone(),
        msg: record.message.clone(),
        attributes,
    };
    Ok(serde_json::to_vec(&wire)?)
}

/// Deserialize a frame payload into a record, validating its shape
pub fn decode_record(payload: &[u8]) -> Result<LogRecord> {
    let wire: WireRecord =
        serde_json::from_slice(payload).map_err(|e| Error::malformed(e.to_string()))?;

    Ok(LogRecord {
        timestamp: timestamp_from_secs(wire.created)?,
        level: wire.level()?,
        logger_name: wire.name,
        message: wire.msg,
        attributes: wire.attributes,
    })
}

/// Decode a payload received from `peer` and prefix its message with the
/// peer address. This is the only place the message is rewritten.
pub fn materialize(payload: &[u8], peer: &str) -> Result<LogRecord> {
    let mut record = decode_record(payload)?;
    record.message = format!("{} {}", peer, record.message);
    Ok(record)
}
