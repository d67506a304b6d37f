//! Configuration management for the backend.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default data-store URL (can be overridden at compile time via TIDEPOOL_STORE_URL).
pub const DEFAULT_STORE_URL: &str = match option_env!("TIDEPOOL_STORE_URL") {
    Some(url) => url,
    None => "https://project.supabase.co",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default listen address for the HTTP surface.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4000";

/// Access tokens live for 15 minutes.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;

/// Refresh tokens live for 30 days.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Main backend configuration.
///
/// Secrets (`store_service_key`, token signing secrets) have no baked-in
/// defaults and must come from the environment or the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Listen address for the HTTP surface.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Hosted data store project URL.
    #[serde(default = "default_store_url")]
    pub store_url: String,
    /// Service-role key for the data store (server-side only, never logged).
    #[serde(default)]
    pub store_service_key: String,
    /// Identity-provider verification endpoint. Empty disables identity login.
    #[serde(default)]
    pub identity_verifier_url: String,
    /// HMAC secret for access tokens.
    #[serde(default)]
    pub access_token_secret: String,
    /// HMAC secret for refresh tokens. Independent from the access secret.
    #[serde(default)]
    pub refresh_token_secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_access_ttl() -> i64 {
    DEFAULT_ACCESS_TTL_SECS
}

fn default_refresh_ttl() -> i64 {
    DEFAULT_REFRESH_TTL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bind_addr: default_bind_addr(),
            store_url: default_store_url(),
            store_service_key: String::new(),
            identity_verifier_url: String::new(),
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a JSON file if it exists, then apply
    /// environment overrides.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override configuration from `TIDEPOOL_*` environment variables.
    fn load_from_env(&mut self) {
        if let Ok(v) = std::env::var("TIDEPOOL_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Ok(v) = std::env::var("TIDEPOOL_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Ok(v) = std::env::var("TIDEPOOL_STORE_URL") {
            self.store_url = v;
        }
        if let Ok(v) = std::env::var("TIDEPOOL_STORE_SERVICE_KEY") {
            self.store_service_key = v;
        }
        if let Ok(v) = std::env::var("TIDEPOOL_IDENTITY_VERIFIER_URL") {
            self.identity_verifier_url = v;
        }
        if let Ok(v) = std::env::var("TIDEPOOL_ACCESS_TOKEN_SECRET") {
            self.access_token_secret = v;
        }
        if let Ok(v) = std::env::var("TIDEPOOL_REFRESH_TOKEN_SECRET") {
            self.refresh_token_secret = v;
        }
        if let Some(v) = parse_i64_env("TIDEPOOL_ACCESS_TTL_SECS") {
            self.access_ttl_secs = v;
        }
        if let Some(v) = parse_i64_env("TIDEPOOL_REFRESH_TTL_SECS") {
            self.refresh_ttl_secs = v;
        }
    }

    /// Get the store URL as a parsed URL.
    pub fn store_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.store_url).map_err(ConfigError::from)
    }
}

fn parse_i64_env(name: &str) -> Option<i64> {
    std::env::var(name).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            trimmed.parse::<i64>().ok()
        }
    })
}
