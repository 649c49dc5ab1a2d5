//! In-memory client used by the tests.
//! Responses are scripted up front; once they run out every call returns an empty page.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::cloudwatch::model::common::{
    LogEvent, LogEventsPage, LogEventsRequest, LogStreamSummary,
};
use crate::cloudwatch::traits::{LogEventOperations, LogStreamOperations};

#[derive(Default)]
pub struct MockLogClient {
    responses: Mutex<VecDeque<Result<LogEventsPage>>>,
    requests: Mutex<Vec<LogEventsRequest>>,
    streams: Mutex<Vec<LogStreamSummary>>,
    /// When set, every fetch waits for one permit before answering
    gate: Option<Arc<Notify>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockLogClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_page(&self, events: Vec<LogEvent>, forward: Option<&str>, backward: Option<&str>) {
        self.responses.lock().unwrap().push_back(Ok(LogEventsPage {
            events,
            next_forward_token: forward.map(str::to_string),
            next_backward_token: backward.map(str::to_string),
        }));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!(message.to_string())));
    }

    pub fn set_streams(&self, streams: Vec<LogStreamSummary>) {
        *self.streams.lock().unwrap() = streams;
    }

    pub fn requests(&self) -> Vec<LogEventsRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogEventOperations for MockLogClient {
    async fn get_log_events(&self, request: &LogEventsRequest) -> Result<LogEventsPage> {
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(LogEventsPage::default()))
    }
}

#[async_trait]
impl LogStreamOperations for MockLogClient {
    async fn list_log_streams(
        &self,
        _log_group: &str,
        limit: Option<i32>,
    ) -> Result<Vec<LogStreamSummary>> {
        let streams = self.streams.lock().unwrap().clone();
        let limit = limit.map_or(streams.len(), |l| usize::try_from(l).unwrap_or(0));
        Ok(streams.into_iter().take(limit).collect())
    }
}
