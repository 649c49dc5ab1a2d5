use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::CONFIG_FILE;

/// Poll interval used by `tail --follow` when a profile doesn't set one
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Expands environment variables in a string value.
/// Supports ${VAR} and $VAR syntax.
pub fn expand_env_vars(value: &str) -> Result<String> {
    shellexpand::env(value)
        .map(|s| s.into_owned())
        .map_err(|e| anyhow::anyhow!("Failed to expand environment variable in '{}': {}", value, e))
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CwtailConfig {
    pub active_profile: Option<String>,
    pub profiles: Option<Vec<ProfileConfig>>,
    #[serde(skip_serializing)]
    pub path: Option<PathBuf>,
}

/// Connection settings for one AWS account/region pair.
/// Anything left out falls back to the default AWS credential and region chain.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct ProfileConfig {
    pub name: String,
    pub region: Option<String>,
    /// Named profile from `~/.aws/config`
    pub aws_profile: Option<String>,
    /// Override for the CloudWatch Logs endpoint, e.g. a local emulator
    pub endpoint_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    /// Maximum number of events per page
    pub page_limit: Option<i32>,
}

impl ProfileConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }
}

impl Default for CwtailConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CwtailConfig {
    /// Creates a new `CwtailConfig` with no profiles and the default config file path.
    pub fn new() -> Self {
        Self {
            active_profile: None,
            profiles: None,
            path: Some(CONFIG_FILE.as_path().to_path_buf()),
        }
    }

    pub fn from_file(config_path: Option<&PathBuf>) -> Result<Self> {
        let path = config_path
            .filter(|p| p.exists())
            .cloned()
            .unwrap_or_else(|| {
                // No valid path was provided by the user, use the default path
                let default_path = CONFIG_FILE.as_path().to_path_buf();
                info!("Using configuration path: {}", default_path.display());
                default_path
            });

        // If no config at the default path, return an empty (default) config
        let toml_config = std::fs::read_to_string(&path).unwrap_or_default();
        let mut config = Self::from_str(&toml_config)?;
        config.path = Some(path);
        Ok(config)
    }

    pub fn from_str(config: &str) -> Result<Self> {
        let config: CwtailConfig = toml::from_str(config)?;
        let num_profiles = config.profiles.as_ref().map_or(0, std::vec::Vec::len);
        info!(
            "Loaded config: profiles={num_profiles}, active_profile={:?}",
            config.active_profile
        );
        Ok(config)
    }

    pub fn find_profile(&self, name: &str) -> Option<&ProfileConfig> {
        self.profiles
            .as_ref()
            .and_then(|profiles| profiles.iter().find(|profile| profile.name == name))
    }

    /// Picks the profile to connect with: the one named on the command line,
    /// then `active_profile`. `None` means "use the AWS defaults".
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<Option<&ProfileConfig>> {
        match name.or(self.active_profile.as_deref()) {
            Some(name) => self
                .find_profile(name)
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("Profile '{name}' not found in config")),
            None => Ok(None),
        }
    }

    pub fn to_str(&self) -> Result<String> {
        toml::to_string(self).map_err(std::convert::Into::into)
    }

    pub fn write_to_file(&self) -> Result<()> {
        let path = self
            .path
            .clone()
            .unwrap_or(CONFIG_FILE.as_path().to_path_buf());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Set restrictive file permissions on Unix systems (0600 = rw-------)
        #[cfg(unix)]
        let mut file = {
            use std::os::unix::fs::OpenOptionsExt;
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .mode(0o600)
                .open(&path)?
        };

        #[cfg(not(unix))]
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&path)?;

        file.write_all(self.to_str()?.as_bytes())?;
        info!("Wrote config to {}", path.display());
        Ok(())
    }
}
