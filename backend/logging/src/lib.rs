//! Structured logging for extkit hosts.
//!
//! Console output plus, when a log directory is configured, daily-rotated
//! NDJSON files.

pub mod logger;

pub use logger::{build_filter, init_logger};
