use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::cloudwatch::model::common::{LogEvent, LogStreamSummary};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// ISO-8601 local date-time, in UTC
fn format_datetime(datetime: DateTime<Utc>) -> String {
    datetime.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_event(event: &LogEvent) -> String {
    let timestamp = event
        .datetime()
        .map_or_else(|| event.timestamp.to_string(), format_datetime);
    format!("{timestamp} {}", event.message.trim_end())
}

pub fn format_stream(stream: &LogStreamSummary) -> String {
    let last_event = stream
        .last_event_time()
        .map_or_else(|| "-".to_string(), format_datetime);
    format!("{last_event:<23} {}", stream.name)
}

/// Writes events one per line, either as text or as JSON objects
pub fn write_events<W: Write>(out: &mut W, events: &[LogEvent], json: bool) -> Result<()> {
    for event in events {
        if json {
            serde_json::to_writer(&mut *out, event)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", format_event(event))?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn write_streams<W: Write>(out: &mut W, streams: &[LogStreamSummary]) -> Result<()> {
    for stream in streams {
        writeln!(out, "{}", format_stream(stream))?;
    }
    out.flush()?;
    Ok(())
}
