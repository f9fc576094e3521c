//! Delivery summary output

use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub collector: String,
    pub sent: u64,
    pub dropped: u64,
}

impl Summary {
    pub fn new(collector: &str) -> Self {
        Self {
            collector: collector.to_string(),
            ..Self::default()
        }
    }
}

/// Summary goes to stderr so stdout stays free for piping
pub fn print_summary(summary: &Summary, json: bool) {
    if json {
        match serde_json::to_string(summary) {
            Ok(json) => eprintln!("{}", json),
            Err(e) => print_error(&format!("Error serializing to JSON: {}", e)),
        }
        return;
    }

    if summary.dropped == 0 {
        eprintln!(
            "{} {} records sent to {}",
            "✓".green(),
            summary.sent,
            summary.collector
        );
    } else {
        eprintln!(
            "{} {} records sent to {}, {} dropped",
            "!".yellow(),
            summary.sent,
            summary.collector,
            summary.dropped.to_string().red()
        );
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}
