//! Telemetry and structured logging for photocritic.
//!
//! Handles subscriber setup, secret redaction, and per-analysis event records.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{AnalysisEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::{redact_sensitive_data, truncate_for_log};
