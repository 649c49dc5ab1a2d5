use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::app::printer::write_streams;
use crate::cloudwatch::client::create_client;
use crate::cloudwatch::config::CwtailConfig;
use crate::cloudwatch::traits::LogStreamOperations;

#[derive(Parser, Debug)]
pub struct StreamsCommand {
    pub log_group: String,
    /// Maximum number of streams to list (the service caps this at 50)
    #[clap(short, long, default_value_t = 50)]
    pub limit: i32,
    #[clap(short, long, env = "CWTAIL_PROFILE")]
    pub profile: Option<String>,
    #[clap(long)]
    pub file: Option<String>,
}

impl StreamsCommand {
    pub async fn run(&self) -> Result<()> {
        let path = self.file.as_ref().map(PathBuf::from);
        let config = CwtailConfig::from_file(path.as_ref())?;
        let profile = config.resolve_profile(self.profile.as_deref())?;
        let client = create_client(profile).await?;

        let mut stdout = std::io::stdout().lock();
        list_streams(&*client, &self.log_group, self.limit, &mut stdout).await
    }
}

async fn list_streams<W: Write>(
    client: &dyn LogStreamOperations,
    log_group: &str,
    limit: i32,
    out: &mut W,
) -> Result<()> {
    let streams = client.list_log_streams(log_group, Some(limit)).await?;
    info!("Found {} stream(s) in {log_group}", streams.len());

    if streams.is_empty() {
        writeln!(out, "No log streams found in {log_group}")?;
        return Ok(());
    }
    write_streams(out, &streams)
}
