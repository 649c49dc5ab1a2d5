use std::path::PathBuf;

use super::model::{prompt_profile, AddCommand};
use crate::cloudwatch::config::{CwtailConfig, ProfileConfig};
use anyhow::Result;

impl AddCommand {
    pub fn run(&self) -> Result<()> {
        let new_profile = prompt_profile(None)?;

        let path = self.file.as_ref().map(PathBuf::from);
        let mut config = CwtailConfig::from_file(path.as_ref())?;

        // If the user provided a custom path, override the config path so write_to_file
        // uses the user-specified location even if it didn't exist during from_file
        if let Some(user_path) = path {
            config.path = Some(user_path);
        }

        insert_profile(&mut config, new_profile, self.activate);
        config.write_to_file()?;

        println!("✅ Profile added successfully!");
        Ok(())
    }
}

/// Adds or replaces the profile with the same name
fn insert_profile(config: &mut CwtailConfig, profile: ProfileConfig, activate: bool) {
    if activate || config.active_profile.is_none() {
        config.active_profile = Some(profile.name.clone());
    }
    let profiles = config.profiles.get_or_insert_with(Vec::new);
    profiles.retain(|existing| existing.name != profile.name);
    profiles.push(profile);
}
