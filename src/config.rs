//! Configuration handling for Nauta Connect

use crate::portal::PORTAL_URL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// How the `watch` command renders the ticking timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeInfo {
    /// No ticking display
    None,
    /// Seconds since the session started
    #[default]
    Elapsed,
    /// Seconds until the quota runs out
    Remain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Usernames with a password stored in the OS keychain
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Account `login` uses when `--user` is not given
    #[serde(default)]
    pub current_user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub time_info: TimeInfo,
    /// Notify when the session's quota runs out
    #[serde(default = "default_notify_limits")]
    pub notify_limits: bool,
}

fn default_notify_limits() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            time_info: TimeInfo::default(),
            notify_limits: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal: PortalConfig {
                url: PORTAL_URL.to_string(),
                timeout_secs: 30,
            },
            ui: UiConfig::default(),
            accounts: Vec::new(),
            current_user: None,
        }
    }
}

impl Config {
    pub fn load(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config at `path`, falling back to defaults when the file
    /// does not exist yet
    pub fn load_or_default(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).expect("Failed to serialize config");
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Default location of the config file
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nauta-connect")
        .join("config.toml")
}

/// Default location of the persisted session state
pub fn session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nauta-connect")
        .join("session.json")
}
