//! Analysis Event Logger
//!
//! One structured record per analysis phase, correlated by analysis id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    Requested {
        backend: String,
        mime_type: String,
        image_bytes: usize,
    },
    Completed {
        backend: String,
        latency_ms: u64,
        reply_chars: usize,
    },
    Parsed {
        confidences: Vec<u8>,
        average_confidence: u8,
    },
    Failed {
        kind: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub analysis_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: AnalysisEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Build the log record for an event, redacting free-text fields.
    pub fn entry(analysis_id: Uuid, mut event: AnalysisEvent) -> EventLogEntry {
        if let AnalysisEvent::Failed { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }
        EventLogEntry {
            analysis_id,
            timestamp: Utc::now(),
            event,
        }
    }

    /// Logs an analysis event through the tracing system.
    pub fn log_event(analysis_id: Uuid, event: AnalysisEvent) {
        let entry = Self::entry(analysis_id, event);
        let record = serde_json::to_string(&entry).unwrap_or_default();
        match entry.event {
            AnalysisEvent::Failed { .. } => {
                warn!(target: "analysis_events", analysis_id = %analysis_id, event = %record, "Analysis failed")
            }
            _ => info!(target: "analysis_events", analysis_id = %analysis_id, event = %record, "Analysis event"),
        }
    }
}
