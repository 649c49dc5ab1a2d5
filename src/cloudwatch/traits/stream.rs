use anyhow::Result;
use async_trait::async_trait;

use crate::cloudwatch::model::common::LogStreamSummary;

/// Trait for discovering the streams of a log group
#[async_trait]
pub trait LogStreamOperations: Send + Sync {
    /// List the streams of a log group, most recently written first
    async fn list_log_streams(
        &self,
        log_group: &str,
        limit: Option<i32>,
    ) -> Result<Vec<LogStreamSummary>>;
}
