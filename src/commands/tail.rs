use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use log::warn;

use crate::app::pager::PagerOptions;
use crate::app::{run_tail, TailOptions, TailStart};
use crate::cloudwatch::client::create_client;
use crate::cloudwatch::config::{CwtailConfig, ProfileConfig};

#[derive(Parser, Debug)]
pub struct TailCommand {
    pub log_group: String,
    pub log_stream: String,
    /// Start at the oldest event instead of the newest
    #[clap(long, conflicts_with = "around")]
    pub head: bool,
    /// Open the stream around this time (RFC 3339 or epoch milliseconds)
    #[clap(long, value_parser = parse_time)]
    pub around: Option<DateTime<Utc>>,
    /// Half-width of the `--around` window
    #[clap(long, default_value_t = 300)]
    pub radius_secs: u64,
    /// Number of older pages to load before the first one
    #[clap(long, default_value_t = 0)]
    pub older: usize,
    /// Keep polling for new events until Ctrl-C
    #[clap(short = 'f', long)]
    pub follow: bool,
    /// Print events as JSON lines
    #[clap(long)]
    pub json: bool,
    #[clap(short, long, env = "CWTAIL_PROFILE")]
    pub profile: Option<String>,
    #[clap(long)]
    pub file: Option<String>,
}

impl TailCommand {
    pub async fn run(&self) -> Result<()> {
        let path = self.file.as_ref().map(PathBuf::from);
        let config = CwtailConfig::from_file(path.as_ref())?;
        let profile = config.resolve_profile(self.profile.as_deref())?;
        let client = create_client(profile).await?;

        let mut stdout = std::io::stdout().lock();
        run_tail(
            client,
            &self.log_group,
            &self.log_stream,
            pager_options(profile),
            &self.tail_options(),
            &mut stdout,
            shutdown_signal(),
        )
        .await
    }

    fn tail_options(&self) -> TailOptions {
        let start = match self.around {
            Some(center) => TailStart::Around {
                center,
                radius: Duration::from_secs(self.radius_secs),
            },
            None if self.head => TailStart::Head,
            None => TailStart::Tail,
        };
        TailOptions {
            start,
            older_pages: self.older,
            follow: self.follow,
            json: self.json,
        }
    }
}

pub fn pager_options(profile: Option<&ProfileConfig>) -> PagerOptions {
    profile.map_or_else(PagerOptions::default, |profile| PagerOptions {
        poll_interval: profile.poll_interval(),
        page_limit: profile.page_limit,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Accepts RFC 3339 timestamps and epoch milliseconds
pub fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| format!("Unable to parse time '{value}': expected RFC 3339 or epoch milliseconds"))
}
