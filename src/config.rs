//! Server configuration
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object (or no file at all) yields a working server.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "ROOM_BROADCAST_CONFIG";

/// Top-level server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener address
    pub bind_addr: String,
    /// Rooms created at startup
    pub rooms: Vec<String>,
    /// Usernames allowed to create and delete rooms
    pub admins: Vec<String>,
    /// Per-connection outbound queue capacity
    pub outbound_buffer: usize,
    pub quote: QuoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            rooms: vec!["general".to_string()],
            admins: Vec::new(),
            outbound_buffer: 64,
            quote: QuoteConfig::default(),
        }
    }
}

/// Stock quote source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Base URL of the CSV quote endpoint
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub on_failure: QuoteFailurePolicy,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://stooq.com/q/l/".to_string(),
            timeout_secs: 10,
            on_failure: QuoteFailurePolicy::Room,
        }
    }
}

/// Where a failed quote lookup is reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteFailurePolicy {
    /// Broadcast a failure notice to the room (and log it)
    #[default]
    Room,
    /// Log only
    Log,
}

impl Config {
    /// Parse a JSON config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from the file named by `ROOM_BROADCAST_CONFIG`, or defaults
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.rooms, vec!["general".to_string()]);
        assert!(config.admins.is_empty());
        assert_eq!(config.quote.timeout_secs, 10);
        assert_eq!(config.quote.on_failure, QuoteFailurePolicy::Room);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "bind_addr": "0.0.0.0:9000",
            "admins": ["root"],
            "quote": { "on_failure": "log" }
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.admins, vec!["root".to_string()]);
        assert_eq!(config.quote.on_failure, QuoteFailurePolicy::Log);
        assert_eq!(config.quote.endpoint, "https://stooq.com/q/l/");
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
