use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatchlogs as cloudwatchlogs;
use cloudwatchlogs::types::{LogStream, OrderBy, OutputLogEvent};
use log::{debug, info};

use crate::cloudwatch::config::{expand_env_vars, ProfileConfig};
use crate::cloudwatch::model::common::log_stream::sort_by_last_event;
use crate::cloudwatch::model::common::{
    LogEvent, LogEventsPage, LogEventsRequest, LogStreamSummary, RequestWindow,
};
use crate::cloudwatch::traits::{LogEventOperations, LogStreamOperations};

/// CloudWatch Logs client backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SdkClient {
    client: cloudwatchlogs::Client,
}

impl SdkClient {
    /// Creates a client from the default AWS configuration, narrowed by the profile's overrides
    pub async fn new(profile: Option<&ProfileConfig>) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(profile) = profile {
            info!("☁️ Using profile: {}", profile.name);
            if let Some(region) = &profile.region {
                loader = loader.region(Region::new(expand_env_vars(region)?));
            }
            if let Some(aws_profile) = &profile.aws_profile {
                loader = loader.profile_name(expand_env_vars(aws_profile)?);
            }
            if let Some(endpoint_url) = &profile.endpoint_url {
                let endpoint_url = expand_env_vars(endpoint_url)?;
                info!("🔗 Endpoint override: {endpoint_url}");
                loader = loader.endpoint_url(endpoint_url);
            }
        }

        let config = loader.load().await;
        let client = cloudwatchlogs::Client::new(&config);
        Ok(Self { client })
    }
}

/// `None` for entries that carry neither a timestamp nor a message
fn convert_event(event: OutputLogEvent) -> Option<LogEvent> {
    if event.timestamp.is_none() && event.message.is_none() {
        return None;
    }
    Some(LogEvent {
        timestamp: event.timestamp.unwrap_or(0),
        message: event.message.unwrap_or_default(),
        ingestion_time: event.ingestion_time,
    })
}

fn convert_stream(stream: LogStream) -> Option<LogStreamSummary> {
    Some(LogStreamSummary {
        name: stream.log_stream_name?,
        last_event_timestamp: stream.last_event_timestamp,
    })
}

#[async_trait]
impl LogEventOperations for SdkClient {
    async fn get_log_events(&self, request: &LogEventsRequest) -> Result<LogEventsPage> {
        let mut builder = self
            .client
            .get_log_events()
            .log_group_name(&request.log_group)
            .log_stream_name(&request.log_stream)
            .set_limit(request.limit);

        builder = match &request.window {
            RequestWindow::TimeRange {
                start_time,
                end_time,
            } => builder.start_time(*start_time).end_time(*end_time),
            RequestWindow::FromEnd { from_head } => builder.start_from_head(*from_head),
            // The token itself encodes the direction
            RequestWindow::Continuation { token, .. } => builder
                .start_from_head(true)
                .set_next_token(token.clone()),
        };

        debug!("GetLogEvents request: {request:?}");
        let response = builder.send().await.with_context(|| {
            format!(
                "Failed to get log events for {}/{}",
                request.log_group, request.log_stream
            )
        })?;

        let page = LogEventsPage {
            next_forward_token: response.next_forward_token,
            next_backward_token: response.next_backward_token,
            events: response
                .events
                .unwrap_or_default()
                .into_iter()
                .filter_map(convert_event)
                .collect(),
        };
        debug!(
            "GetLogEvents returned {} events, forward={:?}, backward={:?}",
            page.events.len(),
            page.next_forward_token,
            page.next_backward_token
        );
        Ok(page)
    }
}

#[async_trait]
impl LogStreamOperations for SdkClient {
    async fn list_log_streams(
        &self,
        log_group: &str,
        limit: Option<i32>,
    ) -> Result<Vec<LogStreamSummary>> {
        let response = self
            .client
            .describe_log_streams()
            .log_group_name(log_group)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .set_limit(limit)
            .send()
            .await
            .with_context(|| format!("Failed to list log streams for log group: {log_group}"))?;

        let mut streams: Vec<LogStreamSummary> = response
            .log_streams
            .unwrap_or_default()
            .into_iter()
            .filter_map(convert_stream)
            .collect();
        sort_by_last_event(&mut streams);

        debug!("DescribeLogStreams returned {} streams", streams.len());
        Ok(streams)
    }
}
