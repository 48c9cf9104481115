//! Configuration management
//!
//! Config file location: ~/.loadstate/config.yaml. A missing file means
//! defaults; unknown or absent fields fall back to defaults too.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_NAME, APP_VERSION, CONFIG_DIR_NAME, DEFAULT_BASE_URL, DEFAULT_KEY_PARAM, DEFAULT_PATH,
    DEFAULT_TIMEOUT_SECS,
};
use crate::models::ApiEndpoint;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_key: Option<String>,
    pub key_param: String,
    /// Requested by the viewer when no argument is given
    pub default_path: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_key: None,
            key_param: String::from(DEFAULT_KEY_PARAM),
            default_path: String::from(DEFAULT_PATH),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("{}/{}", APP_NAME, APP_VERSION),
            log_file: format!("{}.log", APP_NAME),
        }
    }
}

impl Config {
    /// Directory holding the config and the key-value store
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
    }

    /// Get the config file path
    pub fn path() -> PathBuf {
        Self::dir().join("config.yaml")
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Load from `path`, or defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Endpoint built from the base URL and key settings
    pub fn endpoint(&self) -> ApiEndpoint {
        ApiEndpoint {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            key_param: self.key_param.clone(),
        }
    }
}
