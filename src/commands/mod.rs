use std::fs::File;

use anyhow::Result;
use log::{info, LevelFilter};
use simplelog::{Config, WriteLogger};

pub mod config;
pub mod streams;
pub mod tail;

pub fn setup_logging(log_level: &str) -> Result<()> {
    let log_dir = crate::get_state_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join(format!(
        "cwtail-debug-{}.log",
        chrono::Local::now().format("%Y%m%d%H%M%S")
    ));

    WriteLogger::init(
        parse_level(log_level),
        Config::default(),
        File::create(&log_file_path)?,
    )?;

    // Log the file location so users know where to find it
    info!("Logging to: {}", log_file_path.display());
    Ok(())
}

fn parse_level(log_level: &str) -> LevelFilter {
    match log_level.to_lowercase().as_str() {
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}
