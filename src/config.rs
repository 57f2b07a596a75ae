//! Library configuration.
//!
//! This module handles loading and saving the session-kit configuration:
//! the keyring service name, the location of the fallback credential file,
//! and the optional base URL of the remote authentication API.
//!
//! Configuration is stored at `~/.config/session-kit/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "session-kit";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Fallback credential file name
const FALLBACK_STORE_FILE: &str = "credentials.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Service name the keyring entries are registered under.
    pub service_name: String,
    /// Directory holding the fallback credential file. Defaults to the
    /// platform data directory when unset.
    pub fallback_store_dir: Option<PathBuf>,
    /// Base URL of the remote authentication API, when one is deployed.
    pub api_base_url: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            service_name: APP_NAME.to_string(),
            fallback_store_dir: None,
            api_base_url: None,
        }
    }
}

impl AuthConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Location of the fallback credential file.
    pub fn fallback_store_path(&self) -> Result<PathBuf> {
        let dir = match &self.fallback_store_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?
                .join(APP_NAME),
        };
        Ok(dir.join(FALLBACK_STORE_FILE))
    }
}
