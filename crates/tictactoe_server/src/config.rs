//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable overriding the bind host.
pub const ENV_HOST: &str = "TICTACTOE_HOST";
/// Environment variable overriding the bind port.
pub const ENV_PORT: &str = "TICTACTOE_PORT";
/// Environment variable overriding the database path.
pub const ENV_DATABASE_URL: &str = "TICTACTOE_DATABASE_URL";
/// Environment variable overriding the log filter.
pub const ENV_LOG: &str = "TICTACTOE_LOG";

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database path (created if it doesn't exist).
    #[serde(default = "default_database_url")]
    database_url: String,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    log_filter: String,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

#[instrument]
fn default_database_url() -> String {
    "tictactoe.db".to_string()
}

#[instrument]
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            log_filter: default_log_filter(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies `TICTACTOE_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Applies `TICTACTOE_*` overrides read through `lookup`.
    #[instrument(skip(self, lookup))]
    pub fn with_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid {} '{}': {}", ENV_PORT, port, e)))?;
        }
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database_url = url;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        debug!(config = ?self, "Environment applied");
        Ok(self)
    }

    /// Applies command-line overrides; `None` keeps the current value.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        database_url: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(url) = database_url {
            self.database_url = url;
        }
        self
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new config error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = ServerConfig::from_toml("port = 8080\n").expect("Parse failed");
        assert_eq!(*config.port(), 8080);
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.database_url(), "tictactoe.db");
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(ServerConfig::from_toml("port = \"many\"").is_err());
    }

    #[test]
    fn test_env_then_flags() {
        let env: HashMap<&str, &str> = [
            (ENV_HOST, "0.0.0.0"),
            (ENV_PORT, "4000"),
            (ENV_LOG, "debug"),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::default()
            .with_env_from(|key| env.get(key).map(|v| v.to_string()))
            .expect("Env failed")
            .with_overrides(None, Some(5000), Some("games.db".to_string()));

        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(*config.port(), 5000);
        assert_eq!(config.database_url(), "games.db");
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_bad_env_port_is_an_error() {
        let result = ServerConfig::default().with_env_from(|key| {
            (key == ENV_PORT).then(|| "eighty".to_string())
        });
        assert!(result.is_err());
    }
}
