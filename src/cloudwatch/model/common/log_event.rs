use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single event read from a log stream.
/// The pager never looks inside an event; it only counts and forwards them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    /// Event time in milliseconds since the epoch
    pub timestamp: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_time: Option<i64>,
}

impl LogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
            ingestion_time: None,
        }
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// One page of events together with the continuation tokens returned alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEventsPage {
    pub events: Vec<LogEvent>,
    pub next_forward_token: Option<String>,
    pub next_backward_token: Option<String>,
}
