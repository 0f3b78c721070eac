//! # Client Configuration
//!
//! Where the backend lives and how to talk to it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TRADEDESK_BASE_URL=https://erp.example.com                         │
//! │     TRADEDESK_TIMEOUT_SECS=15                                          │
//! │     TRADEDESK_TOKEN=...                                                │
//! │     TRADEDESK_HISTORY=off                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tradedesk/client.toml (Linux)                            │
//! │     ~/Library/Application Support/com.tradedesk.tradedesk/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8080, 30s timeout, history lookups on             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [server]
//! base_url = "https://erp.example.com"
//! timeout_secs = 30
//! token = "..."
//!
//! [lookup]
//! history_enabled = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Server Settings
// =============================================================================

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Base URL of the backend API (no trailing `/api`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            token: None,
        }
    }
}

// =============================================================================
// Lookup Settings
// =============================================================================

/// Advisory lookups made while a form is being edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupSettings {
    /// Fetch last-transaction history when an item is assigned to a row.
    #[serde(default = "default_true")]
    pub history_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LookupSettings {
    fn default() -> Self {
        LookupSettings {
            history_enabled: true,
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub lookup: LookupSettings,
}

impl ClientConfig {
    /// Creates a config pointing at `base_url` with defaults elsewhere.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            server: ServerSettings {
                base_url: base_url.into(),
                ..ServerSettings::default()
            },
            ..ClientConfig::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = url::Url::parse(&self.server.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got: {}",
                self.server.base_url
            )));
        }

        if self.server.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `TRADEDESK_*` overrides read through `lookup`.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TRADEDESK_BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.server.base_url = url;
        }

        if let Some(timeout) = lookup("TRADEDESK_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.server.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric TRADEDESK_TIMEOUT_SECS"),
            }
        }

        if let Some(token) = lookup("TRADEDESK_TOKEN") {
            self.server.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(history) = lookup("TRADEDESK_HISTORY") {
            match history.to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => self.lookup.history_enabled = true,
                "0" | "false" | "off" | "no" => self.lookup.history_enabled = false,
                _ => warn!(value = %history, "Unknown TRADEDESK_HISTORY value"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tradedesk", "tradedesk")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server.base_url, "http://localhost:8080");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.lookup.history_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::new("ftp://erp.local");
        assert!(config.validate().is_err());

        config.server.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.server.base_url = "https://erp.local".to_string();
        assert!(config.validate().is_ok());

        config.server.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TRADEDESK_BASE_URL", "https://erp.example.com"),
            ("TRADEDESK_TIMEOUT_SECS", "5"),
            ("TRADEDESK_TOKEN", "secret"),
            ("TRADEDESK_HISTORY", "off"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.base_url, "https://erp.example.com");
        assert_eq!(config.server.timeout_secs, 5);
        assert_eq!(config.server.token.as_deref(), Some("secret"));
        assert!(!config.lookup.history_enabled);
    }

    #[test]
    fn test_bad_override_values_are_ignored() {
        let mut config = ClientConfig::default();
        config.apply_overrides(|k| match k {
            "TRADEDESK_TIMEOUT_SECS" => Some("soon".to_string()),
            "TRADEDESK_HISTORY" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config.server.timeout_secs, 30);
        assert!(config.lookup.history_enabled);
    }

    #[test]
    fn test_toml_parsing() {
        let config: ClientConfig = toml::from_str(
            r#"
            [server]
            base_url = "https://erp.local"

            [lookup]
            history_enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.server.base_url, "https://erp.local");
        assert_eq!(config.server.timeout_secs, 30);
        assert!(!config.lookup.history_enabled);
    }
}
