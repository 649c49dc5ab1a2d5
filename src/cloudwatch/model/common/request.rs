use std::time::Duration;

use chrono::{DateTime, Utc};
use strum::Display;

/// Paging direction relative to the stream's chronological order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Direction {
    /// Toward newer events
    Forward,
    /// Toward older events
    Backward,
}

/// Which slice of the stream a request asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestWindow {
    /// Events between two instants, both in epoch milliseconds
    TimeRange { start_time: i64, end_time: i64 },
    /// The first (`from_head`) or last page of the stream
    FromEnd { from_head: bool },
    /// Resume from a token returned by an earlier page.
    /// A missing token starts over from the head.
    Continuation {
        token: Option<String>,
        direction: Direction,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEventsRequest {
    pub log_group: String,
    pub log_stream: String,
    pub window: RequestWindow,
    pub limit: Option<i32>,
}

impl LogEventsRequest {
    pub fn new(log_group: &str, log_stream: &str, window: RequestWindow) -> Self {
        Self {
            log_group: log_group.to_string(),
            log_stream: log_stream.to_string(),
            window,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<i32>) -> Self {
        self.limit = limit;
        self
    }
}

impl RequestWindow {
    /// `[center - radius, center + radius]`, saturating at the bounds of `i64`
    pub fn around(center: DateTime<Utc>, radius: Duration) -> Self {
        let center = center.timestamp_millis();
        let radius = i64::try_from(radius.as_millis()).unwrap_or(i64::MAX);
        RequestWindow::TimeRange {
            start_time: center.saturating_sub(radius),
            end_time: center.saturating_add(radius),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_around() {
        let center = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let window = RequestWindow::around(center, Duration::from_secs(60));
        assert_eq!(
            window,
            RequestWindow::TimeRange {
                start_time: 1_704_067_140_000,
                end_time: 1_704_067_260_000,
            }
        );
    }

    #[test]
    fn test_window_around_saturates() {
        let center = DateTime::from_timestamp_millis(0).unwrap();
        let window = RequestWindow::around(center, Duration::MAX);
        assert_eq!(
            window,
            RequestWindow::TimeRange {
                start_time: -i64::MAX,
                end_time: i64::MAX,
            }
        );
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Forward.to_string(), "Forward");
        assert_eq!(Direction::Backward.to_string(), "Backward");
    }
}
