//! Notifier configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Library server URL
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Run once immediately instead of waiting for the first midnight
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,

    /// Attempts to reach the server before giving up at start-up
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server_url() -> String {
    "http://localhost:5212".to_string()
}

fn default_run_on_startup() -> bool {
    true
}

fn default_connect_retries() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            run_on_startup: default_run_on_startup(),
            connect_retries: default_connect_retries(),
            log_level: default_log_level(),
        }
    }
}

impl NotifierConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        // Start with the config file, or defaults if there is none
        let config = match Self::find_config_file() {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };

        // Environment takes precedence
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `LIBRARY_*` overrides obtained through `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("LIBRARY_SERVER_URL") {
            self.server_url = url;
        }

        if let Some(val) = lookup("LIBRARY_NOTIFIER_RUN_ON_STARTUP") {
            self.run_on_startup = val.parse().unwrap_or(self.run_on_startup);
        }

        if let Some(val) = lookup("LIBRARY_NOTIFIER_CONNECT_RETRIES") {
            self.connect_retries = val.parse().unwrap_or(self.connect_retries);
        }

        if let Some(level) = lookup("LIBRARY_LOG_LEVEL") {
            self.log_level = level;
        }

        self
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let locations = [
            Some(PathBuf::from("library-notifier.toml")),
            Some(PathBuf::from("/etc/library/notifier.toml")),
            dirs::config_dir().map(|p| p.join("library").join("notifier.toml")),
        ];

        locations.into_iter().flatten().find(|p| p.exists())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
