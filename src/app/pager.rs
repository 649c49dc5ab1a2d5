//! Paged and streaming retrieval of the events of one log stream.
//!
//! A [`LogStreamPager`] runs at most one operation at a time: a single page fetch
//! or the streaming loop. Operations requested while another one is running are
//! dropped, not queued. Results travel back to the owner as [`PagerUpdate`]s on
//! the channel handed to [`LogStreamPager::new`].
//!
//! Tokens move only once the page they came with has a reserved place on that
//! channel, so a page whose tokens were saved is always delivered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use strum::Display;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

use crate::cloudwatch::model::common::{
    Direction, LogEvent, LogEventsPage, LogEventsRequest, RequestWindow,
};
use crate::cloudwatch::traits::LogEventOperations;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The operation a fetch was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FetchKind {
    InitialAround,
    Initial,
    Forward,
    Backward,
    Stream,
}

impl FetchKind {
    fn saves_forward_token(self) -> bool {
        !matches!(self, FetchKind::Backward)
    }

    fn saves_backward_token(self) -> bool {
        matches!(
            self,
            FetchKind::InitialAround | FetchKind::Initial | FetchKind::Backward
        )
    }
}

/// Outcome of one completed fetch
#[derive(Debug)]
pub enum PagerUpdate {
    Events {
        kind: FetchKind,
        events: Vec<LogEvent>,
    },
    /// The fetch failed; no token was touched
    Failed {
        kind: FetchKind,
        error: anyhow::Error,
    },
}

/// Continuation tokens as of the last completed fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    pub forward: Option<String>,
    pub backward: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PagerOptions {
    /// Wait between two fetches of the streaming loop
    pub poll_interval: Duration,
    pub page_limit: Option<i32>,
}

impl Default for PagerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            page_limit: None,
        }
    }
}

enum PagerState {
    Idle,
    /// Holds until the task running the operation has finished, even once cancelled
    Active {
        id: u64,
        kind: FetchKind,
        cancel: CancellationToken,
    },
    Disposed,
}

struct Shared {
    client: Arc<dyn LogEventOperations>,
    log_group: String,
    log_stream: String,
    options: PagerOptions,
    updates: Sender<PagerUpdate>,
    tokens: Mutex<Tokens>,
    state: Mutex<PagerState>,
    next_id: AtomicU64,
}

/// Holds the pager's single active slot. Dropping it returns the pager to
/// idle, unless the pager was disposed in the meantime.
struct ActiveSlot {
    shared: Arc<Shared>,
    id: u64,
    cancel: CancellationToken,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        let mut state = lock(&self.shared.state);
        if matches!(*state, PagerState::Active { id, .. } if id == self.id) {
            *state = PagerState::Idle;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct LogStreamPager {
    shared: Arc<Shared>,
}

impl LogStreamPager {
    pub fn new(
        client: Arc<dyn LogEventOperations>,
        log_group: &str,
        log_stream: &str,
        options: PagerOptions,
        updates: Sender<PagerUpdate>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                log_group: log_group.to_string(),
                log_stream: log_stream.to_string(),
                options,
                updates,
                tokens: Mutex::new(Tokens::default()),
                state: Mutex::new(PagerState::Idle),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn tokens(&self) -> Tokens {
        lock(&self.shared.tokens).clone()
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        matches!(*lock(&self.shared.state), PagerState::Active { .. })
    }

    /// `false` as soon as the loop is paused, even while it is still winding down
    pub fn is_streaming(&self) -> bool {
        matches!(
            &*lock(&self.shared.state),
            PagerState::Active {
                kind: FetchKind::Stream,
                cancel,
                ..
            } if !cancel.is_cancelled()
        )
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        matches!(*lock(&self.shared.state), PagerState::Disposed)
    }

    /// Loads the events within `radius` of `center` and resets both tokens.
    /// Returns `false` if another operation is running.
    pub fn load_initial_around(&self, center: DateTime<Utc>, radius: Duration) -> bool {
        self.spawn_fetch(
            FetchKind::InitialAround,
            RequestWindow::around(center, radius),
        )
    }

    /// Loads the first or last page of the stream and resets both tokens.
    /// Returns `false` if another operation is running.
    pub fn load_initial(&self, from_head: bool) -> bool {
        self.spawn_fetch(FetchKind::Initial, RequestWindow::FromEnd { from_head })
    }

    /// Loads the page after the forward token. Only the forward token moves.
    pub fn load_more_forward(&self) -> bool {
        self.spawn_fetch(
            FetchKind::Forward,
            self.shared.continuation(Direction::Forward),
        )
    }

    /// Loads the page before the backward token. Only the backward token moves.
    pub fn load_more_backward(&self) -> bool {
        self.spawn_fetch(
            FetchKind::Backward,
            self.shared.continuation(Direction::Backward),
        )
    }

    /// Polls forward from the forward token every `poll_interval` until paused,
    /// disposed, or a fetch fails. The loop holds the active slot for its whole
    /// lifetime.
    pub fn start_streaming(&self) -> bool {
        let Some(slot) = self.begin(FetchKind::Stream) else {
            return false;
        };
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            info!(
                "Streaming {}/{} every {:?}",
                shared.log_group, shared.log_stream, shared.options.poll_interval
            );
            loop {
                let request = shared.request(shared.continuation(Direction::Forward));
                let outcome = tokio::select! {
                    biased;
                    () = slot.cancel.cancelled() => break,
                    outcome = shared.fetch(FetchKind::Stream, request) => outcome,
                };
                let page = match outcome {
                    Ok(page) => page,
                    Err(error) => {
                        shared.report_failure(FetchKind::Stream, error, slot).await;
                        return;
                    }
                };

                let permit = tokio::select! {
                    biased;
                    () = slot.cancel.cancelled() => break,
                    permit = shared.updates.reserve() => permit,
                };
                let Ok(permit) = permit else {
                    debug!("Update receiver dropped, stopping stream");
                    break;
                };
                let Some(events) = shared.commit(FetchKind::Stream, page, &slot.cancel) else {
                    break;
                };
                permit.send(PagerUpdate::Events {
                    kind: FetchKind::Stream,
                    events,
                });

                tokio::select! {
                    biased;
                    () = slot.cancel.cancelled() => break,
                    () = tokio::time::sleep(shared.options.poll_interval) => {}
                }
            }
            info!("Streaming {}/{} stopped", shared.log_group, shared.log_stream);
        });
        true
    }

    /// Stops the streaming loop, including a fetch it is waiting on.
    /// Tokens keep their values, so a later `start_streaming` resumes where this one stopped.
    /// The pager stays busy until the loop has actually exited; requests made before
    /// that are dropped like any other overlapping request.
    /// Does nothing unless the pager is streaming.
    pub fn pause_streaming(&self) {
        let state = lock(&self.shared.state);
        if let PagerState::Active {
            kind: FetchKind::Stream,
            cancel,
            ..
        } = &*state
        {
            if cancel.is_cancelled() {
                return;
            }
            cancel.cancel();
            info!(
                "Paused streaming {}/{}",
                self.shared.log_group, self.shared.log_stream
            );
        }
    }

    /// Cancels whatever is running and rejects every later operation. Safe to call twice.
    pub fn dispose(&self) {
        let mut state = lock(&self.shared.state);
        match &*state {
            PagerState::Disposed => return,
            PagerState::Active { cancel, .. } => cancel.cancel(),
            PagerState::Idle => {}
        }
        *state = PagerState::Disposed;
        info!(
            "Disposed pager for {}/{}",
            self.shared.log_group, self.shared.log_stream
        );
    }

    /// Moves Idle to Active in one step under the state lock
    fn begin(&self, kind: FetchKind) -> Option<ActiveSlot> {
        let mut state = lock(&self.shared.state);
        match &*state {
            PagerState::Idle => {
                let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
                let cancel = CancellationToken::new();
                *state = PagerState::Active {
                    id,
                    kind,
                    cancel: cancel.clone(),
                };
                Some(ActiveSlot {
                    shared: Arc::clone(&self.shared),
                    id,
                    cancel,
                })
            }
            PagerState::Active {
                kind: active,
                cancel,
                ..
            } => {
                if cancel.is_cancelled() {
                    debug!("Dropping {kind} request, {active} is still stopping");
                } else {
                    debug!("Dropping {kind} request, {active} still in flight");
                }
                None
            }
            PagerState::Disposed => {
                debug!("Dropping {kind} request, pager is disposed");
                None
            }
        }
    }

    fn spawn_fetch(&self, kind: FetchKind, window: RequestWindow) -> bool {
        let Some(slot) = self.begin(kind) else {
            return false;
        };
        let shared = Arc::clone(&self.shared);
        let request = shared.request(window);
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = slot.cancel.cancelled() => return,
                outcome = shared.fetch(kind, request) => outcome,
            };
            let page = match outcome {
                Ok(page) => page,
                Err(error) => {
                    shared.report_failure(kind, error, slot).await;
                    return;
                }
            };

            let permit = tokio::select! {
                biased;
                () = slot.cancel.cancelled() => return,
                permit = shared.updates.reserve() => permit,
            };
            let Ok(permit) = permit else {
                debug!("Update receiver dropped, {kind} result lost");
                return;
            };
            let Some(events) = shared.commit(kind, page, &slot.cancel) else {
                return;
            };
            // Idle again before the owner hears about it, so it can ask for the next page
            drop(slot);
            permit.send(PagerUpdate::Events { kind, events });
        });
        true
    }
}

impl Drop for LogStreamPager {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Shared {
    fn request(&self, window: RequestWindow) -> LogEventsRequest {
        LogEventsRequest::new(&self.log_group, &self.log_stream, window)
            .with_limit(self.options.page_limit)
    }

    fn continuation(&self, direction: Direction) -> RequestWindow {
        let tokens = lock(&self.tokens);
        let token = match direction {
            Direction::Forward => tokens.forward.clone(),
            Direction::Backward => tokens.backward.clone(),
        };
        RequestWindow::Continuation { token, direction }
    }

    async fn fetch(&self, kind: FetchKind, request: LogEventsRequest) -> Result<LogEventsPage> {
        debug!("{kind} fetch: {:?}", request.window);
        self.client.get_log_events(&request).await
    }

    /// Applies the token policy of `kind` and hands back the page's events.
    /// `None` means the operation was cancelled and the page thrown away.
    fn commit(
        &self,
        kind: FetchKind,
        page: LogEventsPage,
        cancel: &CancellationToken,
    ) -> Option<Vec<LogEvent>> {
        let mut tokens = lock(&self.tokens);
        if cancel.is_cancelled() {
            debug!("{kind} fetch cancelled, discarding {} events", page.events.len());
            return None;
        }
        if kind.saves_forward_token() {
            tokens.forward = page.next_forward_token;
        }
        if kind.saves_backward_token() {
            tokens.backward = page.next_backward_token;
        }
        debug!("{kind} fetch returned {} events", page.events.len());
        Some(page.events)
    }

    /// Releases the slot, then tells the owner about the failure.
    /// A failure that arrives after cancellation is dropped.
    async fn report_failure(&self, kind: FetchKind, error: anyhow::Error, slot: ActiveSlot) {
        if slot.cancel.is_cancelled() {
            debug!("{kind} fetch failed after cancellation: {error:#}");
            return;
        }
        warn!(
            "{kind} fetch for {}/{} failed: {error:#}",
            self.log_group, self.log_stream
        );
        // Free the slot first so the owner can retry straight away
        drop(slot);
        if self
            .updates
            .send(PagerUpdate::Failed { kind, error })
            .await
            .is_err()
        {
            debug!("Update receiver dropped, {kind} failure lost");
        }
    }
}
