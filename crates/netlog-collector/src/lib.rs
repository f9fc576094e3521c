//! netlog Collector - accepts producer connections and persists their records

pub mod server;
pub mod worker;

pub use server::{Collector, CollectorHandle, ServeOptions};
pub use worker::serve_connection;
