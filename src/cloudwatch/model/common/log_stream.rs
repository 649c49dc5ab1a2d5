use chrono::{DateTime, Utc};

/// Summary of a log stream inside a log group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamSummary {
    pub name: String,
    pub last_event_timestamp: Option<i64>,
}

impl LogStreamSummary {
    pub fn last_event_time(&self) -> Option<DateTime<Utc>> {
        self.last_event_timestamp
            .and_then(DateTime::from_timestamp_millis)
    }
}

/// Orders streams by last event time, most recent first.
/// Streams that never received an event go last, ordered by name.
pub fn sort_by_last_event(streams: &mut [LogStreamSummary]) {
    streams.sort_by(|a, b| {
        b.last_event_timestamp
            .cmp(&a.last_event_timestamp)
            .then_with(|| a.name.cmp(&b.name))
    });
}
