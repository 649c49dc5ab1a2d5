use anyhow::Result;
use clap::Parser;
use inquire::validator::Validation;
use inquire::{CustomType, Select, Text};
use strum::{Display, EnumIter, IntoEnumIterator};
use url::Url;

use crate::cloudwatch::config::{ProfileConfig, DEFAULT_POLL_INTERVAL_MS};

#[derive(Parser, Debug)]
pub enum ConfigCommand {
    Add(AddCommand),
    #[clap(alias = "rm")]
    Remove(RemoveCommand),
    Update(UpdateCommand),
    #[clap(alias = "ls")]
    List(ListCommand),
}

impl ConfigCommand {
    pub fn run(&self) -> Result<()> {
        match self {
            ConfigCommand::Add(cmd) => cmd.run(),
            ConfigCommand::Remove(cmd) => cmd.run(),
            ConfigCommand::Update(cmd) => cmd.run(),
            ConfigCommand::List(cmd) => cmd.run(),
        }
    }
}

#[derive(Parser, Debug)]
pub struct AddCommand {
    /// Make the new profile the active one
    #[clap(long)]
    pub activate: bool,
    #[clap(short, long)]
    pub file: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RemoveCommand {
    pub name: Option<String>,
    #[clap(short, long)]
    pub file: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ListCommand {
    #[clap(short, long)]
    pub file: Option<String>,
}

#[derive(Parser, Debug)]
pub struct UpdateCommand {
    pub name: Option<String>,
    #[clap(short, long)]
    pub file: Option<String>,
}

#[derive(EnumIter, Debug, Display, PartialEq)]
pub enum CredentialSource {
    #[strum(to_string = "default credential chain")]
    DefaultChain,
    #[strum(to_string = "named AWS profile")]
    NamedProfile,
}

#[allow(clippy::unnecessary_wraps)]
pub fn validate_endpoint(
    endpoint: &str,
) -> Result<Validation, Box<dyn std::error::Error + Send + Sync>> {
    if endpoint.trim().is_empty() {
        return Ok(Validation::Valid);
    }
    match Url::parse(endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Validation::Valid),
        Ok(url) => Ok(Validation::Invalid(
            format!("⚠️ Unsupported scheme '{}', use http or https", url.scheme()).into(),
        )),
        Err(error) => Ok(Validation::Invalid(error.into())),
    }
}

fn optional(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Asks for every profile field, offering the existing values as defaults
pub fn prompt_profile(existing: Option<&ProfileConfig>) -> Result<ProfileConfig> {
    let existing = existing.cloned().unwrap_or_default();

    let name = Text::new("name").with_default(&existing.name).prompt()?;
    let region = Text::new("region")
        .with_placeholder("eu-west-1")
        .with_help_message("Leave empty to use the default region chain")
        .with_default(existing.region.as_deref().unwrap_or_default())
        .prompt()?;

    let source = Select::new("credentials", CredentialSource::iter().collect()).prompt()?;
    let aws_profile = match source {
        CredentialSource::DefaultChain => None,
        CredentialSource::NamedProfile => optional(
            Text::new("AWS profile name")
                .with_placeholder("${AWS_PROFILE}")
                .with_default(existing.aws_profile.as_deref().unwrap_or_default())
                .prompt()?,
        ),
    };

    let endpoint_url = Text::new("endpoint override")
        .with_help_message("Leave empty to use the regional CloudWatch Logs endpoint")
        .with_default(existing.endpoint_url.as_deref().unwrap_or_default())
        .with_validator(validate_endpoint)
        .prompt()?;

    let poll_interval_ms = CustomType::<u64>::new("poll interval (ms)")
        .with_default(existing.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
        .prompt()?;

    Ok(ProfileConfig {
        name,
        region: optional(region),
        aws_profile,
        endpoint_url: optional(endpoint_url),
        poll_interval_ms: Some(poll_interval_ms),
        page_limit: existing.page_limit,
    })
}
