use anyhow::Result;
use async_trait::async_trait;

use crate::cloudwatch::model::common::{LogEventsPage, LogEventsRequest};

/// Trait for reading pages of log events
#[async_trait]
pub trait LogEventOperations: Send + Sync {
    /// Fetch one page of events for a single log stream.
    /// The page carries the forward and backward continuation tokens the service returned.
    async fn get_log_events(&self, request: &LogEventsRequest) -> Result<LogEventsPage>;
}
