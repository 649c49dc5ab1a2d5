use std::path::PathBuf;

use inquire::Select;

use super::model::RemoveCommand;
use crate::cloudwatch::config::CwtailConfig;
use anyhow::Result;

impl RemoveCommand {
    pub fn run(&self) -> Result<()> {
        let path = self.file.as_ref().map(PathBuf::from);
        let mut config = CwtailConfig::from_file(path.as_ref())?;

        let names: Vec<String> = config
            .profiles
            .iter()
            .flatten()
            .map(|profile| profile.name.clone())
            .collect();
        if names.is_empty() {
            println!("❌ No profiles found in config file");
            return Ok(());
        }

        let name = match &self.name {
            Some(name) => name.clone(),
            None => Select::new("name", names).prompt()?,
        };

        if !remove_profile(&mut config, &name) {
            anyhow::bail!("🤔 Profile '{name}' not found");
        }
        config.write_to_file()?;

        println!("✅ Profile '{name}' removed successfully!");
        Ok(())
    }
}

/// Returns `false` if no profile had that name
fn remove_profile(config: &mut CwtailConfig, name: &str) -> bool {
    let Some(profiles) = config.profiles.as_mut() else {
        return false;
    };
    let before = profiles.len();
    profiles.retain(|profile| profile.name != name);
    if profiles.len() == before {
        return false;
    }
    if config.active_profile.as_deref() == Some(name) {
        config.active_profile = None;
    }
    true
}
