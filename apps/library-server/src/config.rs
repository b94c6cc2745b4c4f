//! Server configuration.

use std::env;

/// `DATABASE_URL` value selecting the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL (`memory` or a `sqlite:` URL).
    pub database_url: String,
    /// Whether to insert demo records into an empty store.
    pub seed_data: bool,
    /// Whether to run the notice scheduler inside the server process.
    pub embedded_notifier: bool,
    /// Log level.
    pub log_level: String,
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match lookup("LIBRARY_SERVER_PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("LIBRARY_SERVER_PORT must be a port number, got {port:?}"))?,
            None => 5212,
        };

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite:library.db?mode=rwc".to_string());
        if database_url != MEMORY_DATABASE_URL && !database_url.starts_with("sqlite:") {
            anyhow::bail!("DATABASE_URL must be \"memory\" or a sqlite: URL");
        }

        Ok(Self {
            host: lookup("LIBRARY_SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url,
            seed_data: lookup("LIBRARY_SEED_DATA").is_none_or(|v| parse_flag(&v)),
            embedded_notifier: lookup("LIBRARY_EMBEDDED_NOTIFIER").is_none_or(|v| parse_flag(&v)),
            log_level: lookup("LIBRARY_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the URL the embedded notifier uses to reach this server.
    pub fn local_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" => "127.0.0.1",
            host => host,
        };
        format!("http://{}:{}", host, self.port)
    }

    /// Returns true if records live only in memory.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.server_addr(), "0.0.0.0:5212");
        assert_eq!(config.local_url(), "http://127.0.0.1:5212");
        assert!(config.seed_data);
        assert!(config.embedded_notifier);
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn test_memory_store_and_flags() {
        let config = config_from(&[
            ("DATABASE_URL", "memory"),
            ("LIBRARY_SEED_DATA", "false"),
            ("LIBRARY_EMBEDDED_NOTIFIER", "0"),
            ("LIBRARY_SERVER_HOST", "localhost"),
        ])
        .unwrap();

        assert!(config.uses_memory_store());
        assert!(!config.seed_data);
        assert!(!config.embedded_notifier);
        assert_eq!(config.local_url(), "http://localhost:5212");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("LIBRARY_SERVER_PORT", "http")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "postgres://db/library")]).is_err());
    }
}
