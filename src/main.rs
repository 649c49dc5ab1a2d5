use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{CommandFactory, Parser};

mod app;
mod cloudwatch;
mod commands;

use anyhow::Result;
use commands::config::model::ConfigCommand;
use commands::streams::StreamsCommand;
use commands::tail::TailCommand;
use dirs::{config_dir, home_dir, state_dir};

/// Configuration file path, following the XDG Base Directory specification
/// (~/.config/cwtail/config.toml)
static CONFIG_FILE: LazyLock<PathBuf> = LazyLock::new(|| {
    config_dir()
        .unwrap_or_else(|| {
            home_dir()
                .expect("HOME directory must be set to run cwtail")
                .join(".config")
        })
        .join("cwtail")
        .join("config.toml")
});

/// State directory path, used for debug logs
pub fn get_state_dir() -> PathBuf {
    state_dir()
        .unwrap_or_else(|| {
            home_dir()
                .expect("HOME directory must be set to run cwtail")
                .join(".local")
                .join("state")
        })
        .join("cwtail")
}

#[derive(Parser)]
#[clap(name = "cwtail", bin_name = "cwtail", version, about)]
struct CwtailApp {
    #[clap(subcommand)]
    command: Option<CwtailCommand>,
}

#[derive(Parser)]
enum CwtailCommand {
    /// Print the events of a log stream, optionally following new ones
    Tail(TailCommand),
    /// List the streams of a log group, most recent first
    Streams(StreamsCommand),
    #[clap(subcommand)]
    Config(ConfigCommand),
}

impl CwtailApp {
    pub async fn run(&self) -> Result<()> {
        if let Ok(log_level) = std::env::var("CWTAIL_LOG") {
            commands::setup_logging(&log_level)?;
        }

        match &self.command {
            Some(CwtailCommand::Tail(cmd)) => cmd.run().await,
            Some(CwtailCommand::Streams(cmd)) => cmd.run().await,
            Some(CwtailCommand::Config(cmd)) => cmd.run(),
            None => {
                CwtailApp::command().print_help()?;
                Ok(())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = CwtailApp::parse();
    app.run().await
}
