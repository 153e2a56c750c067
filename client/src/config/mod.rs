//! Configuration management for the Garden Assistant client
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: GARDEN__)

use anyhow::Result;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use validator::ValidateUrl;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Remote procedure endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Project URL; procedures live under `/rest/v1/rpc/`
    pub url: String,
    /// Public API key sent as `apikey`
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

/// Durable local storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub dir: PathBuf,
    pub queue_key: String,
}

/// Optimistic update behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Refuse a second action for the same task/plant and type while one is unsettled
    pub guard_in_flight: bool,
    /// Capacity of the care event broadcast channel
    pub event_capacity: usize,
}

/// Signed-in user, for headless runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub user_id: Option<String>,
    /// User access token sent as the bearer instead of the API key
    #[serde(default, skip_serializing)]
    pub access_token: Option<SecretString>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            guard_in_flight: true,
            event_capacity: 64,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                url: "http://localhost:54321".to_string(),
                api_key: None,
                timeout_secs: 15,
            },
            storage: StorageConfig {
                dir: PathBuf::from(".garden"),
                queue_key: "offline_care_actions".to_string(),
            },
            sync: SyncConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with GARDEN__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&ClientConfig::default())?)
            .add_source(config::File::with_name(&config_file).required(false))
            // e.g., GARDEN__REMOTE__URL=https://example.supabase.co sets remote.url
            .add_source(config::Environment::with_prefix("GARDEN").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !self.remote.url.validate_url() {
            errors.push(format!("remote.url is not a valid URL: {}", self.remote.url));
        }
        if self.remote.timeout_secs == 0 {
            errors.push("remote.timeout_secs must be greater than 0".to_string());
        }
        if self.storage.queue_key.trim().is_empty() {
            errors.push("storage.queue_key cannot be empty".to_string());
        }
        if matches!(&self.session.user_id, Some(id) if id.trim().is_empty()) {
            errors.push("session.user_id cannot be blank".to_string());
        }
        if self.sync.event_capacity == 0 {
            errors.push("sync.event_capacity must be greater than 0".to_string());
        }

        if !errors.is_empty() {
            anyhow::bail!("Invalid configuration: {}", errors.join("; "));
        }
        Ok(())
    }
}
