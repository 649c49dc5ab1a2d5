use std::path::PathBuf;

use super::model::ListCommand;
use crate::cloudwatch::config::{CwtailConfig, ProfileConfig};
use anyhow::Result;

impl ListCommand {
    pub fn run(&self) -> Result<()> {
        let path = self.file.as_ref().map(PathBuf::from);
        let config = CwtailConfig::from_file(path.as_ref())?;

        let Some(profiles) = config.profiles.as_ref().filter(|p| !p.is_empty()) else {
            println!("❌ No profiles found in config file");
            return Ok(());
        };

        for profile in profiles {
            let active = config.active_profile.as_deref() == Some(profile.name.as_str());
            println!("{}", describe_profile(profile, active));
        }
        Ok(())
    }
}

fn describe_profile(profile: &ProfileConfig, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    let mut line = format!(
        "{marker} {} (region: {}",
        profile.name,
        profile.region.as_deref().unwrap_or("default")
    );
    if let Some(aws_profile) = &profile.aws_profile {
        line.push_str(&format!(", aws profile: {aws_profile}"));
    }
    if let Some(endpoint_url) = &profile.endpoint_url {
        line.push_str(&format!(", endpoint: {endpoint_url}"));
    }
    line.push(')');
    line
}
