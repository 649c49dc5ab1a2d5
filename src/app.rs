use std::collections::VecDeque;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info};
use pager::{LogStreamPager, PagerOptions, PagerUpdate};
use tokio::sync::mpsc::Receiver;

use crate::cloudwatch::model::common::LogEvent;
use crate::cloudwatch::traits::LogEventOperations;

pub mod pager;
pub mod printer;

/// Where the first page of a tail comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailStart {
    Head,
    Tail,
    Around {
        center: DateTime<Utc>,
        radius: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct TailOptions {
    pub start: TailStart,
    /// Number of older pages to load in front of the first one
    pub older_pages: usize,
    pub follow: bool,
    pub json: bool,
}

/// Waits for the outcome of the fetch the pager just started
async fn next_page(rx: &mut Receiver<PagerUpdate>) -> Result<Vec<LogEvent>> {
    match rx.recv().await {
        Some(PagerUpdate::Events { events, .. }) => Ok(events),
        Some(PagerUpdate::Failed { kind, error }) => {
            Err(error.context(format!("{kind} fetch failed")))
        }
        None => anyhow::bail!("Pager stopped before answering"),
    }
}

/// Prints one log stream to `out`: the first page, any requested older pages in
/// front of it, then (with `follow`) new events until `shutdown` resolves.
pub async fn run_tail<W, S>(
    client: Arc<dyn LogEventOperations>,
    log_group: &str,
    log_stream: &str,
    pager_options: PagerOptions,
    options: &TailOptions,
    out: &mut W,
    shutdown: S,
) -> Result<()>
where
    W: Write,
    S: Future<Output = ()>,
{
    let (tx, mut rx) = tokio::sync::mpsc::channel::<PagerUpdate>(100);
    let pager = LogStreamPager::new(client, log_group, log_stream, pager_options, tx);

    info!("Loading {log_group}/{log_stream} from {:?}", options.start);
    match options.start {
        TailStart::Head => pager.load_initial(true),
        TailStart::Tail => pager.load_initial(false),
        TailStart::Around { center, radius } => pager.load_initial_around(center, radius),
    };
    let mut pages = VecDeque::from([next_page(&mut rx).await?]);

    for _ in 0..options.older_pages {
        if !pager.load_more_backward() {
            break;
        }
        let events = next_page(&mut rx).await?;
        // The service answers with an empty page once the start of the stream is reached
        if events.is_empty() {
            debug!("Reached the start of {log_group}/{log_stream}");
            break;
        }
        pages.push_front(events);
    }

    for events in &pages {
        printer::write_events(out, events, options.json)?;
    }

    if !options.follow {
        pager.dispose();
        return Ok(());
    }

    if !pager.start_streaming() {
        anyhow::bail!("Could not start streaming {log_group}/{log_stream}");
    }
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Stopping tail of {log_group}/{log_stream}");
                if pager.is_streaming() {
                    pager.pause_streaming();
                }
                break;
            }
            update = rx.recv() => match update {
                Some(PagerUpdate::Events { events, .. }) => {
                    printer::write_events(out, &events, options.json)?;
                }
                Some(PagerUpdate::Failed { kind, error }) => {
                    pager.dispose();
                    return Err(error.context(format!("{kind} fetch failed")));
                }
                None => break,
            },
        }
    }

    debug!("Tail stopped at {:?}", pager.tokens());
    pager.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudwatch::client::mock::MockLogClient;
    use crate::cloudwatch::model::common::{Direction, RequestWindow};

    fn options(start: TailStart, older_pages: usize, follow: bool) -> TailOptions {
        TailOptions {
            start,
            older_pages,
            follow,
            json: false,
        }
    }

    #[tokio::test]
    async fn test_tail_prints_older_pages_first() {
        let client = Arc::new(MockLogClient::new());
        client.push_page(vec![LogEvent::new(3_000, "newest")], Some("F1"), Some("B1"));
        client.push_page(vec![LogEvent::new(2_000, "older")], Some("F0"), Some("B2"));
        client.push_page(vec![LogEvent::new(1_000, "oldest")], Some("F0"), Some("B3"));
        client.push_page(vec![], Some("F0"), Some("B3"));

        let mut out = Vec::new();
        run_tail(
            client.clone(),
            "g",
            "s",
            PagerOptions::default(),
            &options(TailStart::Tail, 5, false),
            &mut out,
            std::future::pending(),
        )
        .await
        .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert_eq!(
            output,
            "1970-01-01T00:00:01.000 oldest\n\
             1970-01-01T00:00:02.000 older\n\
             1970-01-01T00:00:03.000 newest\n"
        );
        let requests = client.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].window, RequestWindow::FromEnd { from_head: false });
        assert_eq!(
            requests[2].window,
            RequestWindow::Continuation {
                token: Some("B2".to_string()),
                direction: Direction::Backward,
            }
        );
    }

    #[tokio::test]
    async fn test_tail_follow_until_shutdown() {
        let client = Arc::new(MockLogClient::new());
        client.push_page(vec![LogEvent::new(1_000, "first")], Some("F1"), Some("B1"));
        client.push_page(vec![LogEvent::new(2_000, "second")], Some("F2"), Some("B1"));

        let mut out = Vec::new();
        run_tail(
            client.clone(),
            "g",
            "s",
            PagerOptions::default(),
            &options(TailStart::Head, 0, true),
            &mut out,
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await
        .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("first"));
        assert!(output.contains("second"));
        assert_eq!(
            client.requests()[1].window,
            RequestWindow::Continuation {
                token: Some("F1".to_string()),
                direction: Direction::Forward,
            }
        );
    }

    #[tokio::test]
    async fn test_tail_reports_initial_failure() {
        let client = Arc::new(MockLogClient::new());
        client.push_error("ResourceNotFoundException: The specified log group does not exist.");

        let mut out = Vec::new();
        let result = run_tail(
            client,
            "missing",
            "s",
            PagerOptions::default(),
            &options(TailStart::Head, 0, false),
            &mut out,
            std::future::pending(),
        )
        .await;

        let error = result.unwrap_err();
        assert!(format!("{error:#}").contains("ResourceNotFoundException"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_tail_follow_stops_on_stream_failure() {
        let client = Arc::new(MockLogClient::new());
        client.push_page(vec![LogEvent::new(1_000, "first")], Some("F1"), Some("B1"));
        client.push_error("ThrottlingException");

        let mut out = Vec::new();
        let result = run_tail(
            client,
            "g",
            "s",
            PagerOptions::default(),
            &options(TailStart::Head, 0, true),
            &mut out,
            std::future::pending(),
        )
        .await;

        assert!(format!("{:#}", result.unwrap_err()).contains("Stream fetch failed"));
        assert!(String::from_utf8(out).unwrap().contains("first"));
    }
}
