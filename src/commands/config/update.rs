use std::path::PathBuf;

use inquire::Select;

use super::model::{prompt_profile, UpdateCommand};
use crate::cloudwatch::config::{CwtailConfig, ProfileConfig};
use anyhow::Result;

impl UpdateCommand {
    pub fn run(&self) -> Result<()> {
        let path = self.file.as_ref().map(PathBuf::from);
        let mut config = CwtailConfig::from_file(path.as_ref())?;

        let Some(profiles) = config.profiles.as_ref() else {
            println!("❌ No profiles found in config file");
            return Ok(());
        };

        let name = match &self.name {
            Some(name) => name.clone(),
            None => Select::new(
                "name",
                profiles.iter().map(|profile| profile.name.clone()).collect(),
            )
            .prompt()?,
        };

        let Some(profile) = config.find_profile(&name) else {
            anyhow::bail!("🤔 Profile '{name}' not found");
        };

        let updated = prompt_profile(Some(profile))?;
        replace_profile(&mut config, &name, updated)?;

        config.write_to_file()?;
        println!("✅ Profile updated successfully!");
        Ok(())
    }
}

/// Swaps the profile called `name` for `updated`, following a rename in `active_profile`.
/// A rename may not take the name of another profile.
fn replace_profile(config: &mut CwtailConfig, name: &str, updated: ProfileConfig) -> Result<()> {
    let profiles = config.profiles.get_or_insert_with(Vec::new);
    if updated.name != name && profiles.iter().any(|profile| profile.name == updated.name) {
        anyhow::bail!("🤔 Profile '{}' already exists", updated.name);
    }
    let Some(profile) = profiles.iter_mut().find(|profile| profile.name == name) else {
        anyhow::bail!("🤔 Profile '{name}' not found");
    };
    *profile = updated;

    if config.active_profile.as_deref() == Some(name) {
        config.active_profile = Some(profile.name.clone());
    }
    Ok(())
}
