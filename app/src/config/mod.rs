//! Configuration management for the AppFitness engine
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: AF__)

use anyhow::{bail, Result};
use appfitness_shared::timer::{DEFAULT_REST_SECONDS, PRESETS};
use appfitness_shared::validation::MAX_CUSTOM_SECONDS;
use secrecy::SecretString;
use serde::Deserialize;
use std::env;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub cloud: CloudConfig,
    pub identity: IdentityConfig,
    pub timer: TimerConfig,
    pub session: SessionConfig,
}

/// Which store backs the data access facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Sqlite,
    Cloud,
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub sqlite_url: String,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            sqlite_url: "sqlite://appfitness.db?mode=rwc".to_string(),
            max_connections: 4,
        }
    }
}

/// Cloud document store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub base_url: String,
    pub project_id: String,
    pub api_key: SecretString,
    pub timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            project_id: String::new(),
            api_key: SecretString::new(String::new()),
            timeout_secs: 20,
        }
    }
}

/// Federated sign-in configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: SecretString,
    /// Redirect URI registered with the identity provider
    pub request_uri: String,
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            api_key: SecretString::new(String::new()),
            request_uri: "http://localhost".to_string(),
            timeout_secs: 20,
        }
    }
}

/// Rest timer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub default_seconds: u32,
    pub presets: Vec<u32>,
    pub max_custom_seconds: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_seconds: DEFAULT_REST_SECONDS,
            presets: PRESETS.to_vec(),
            max_custom_seconds: MAX_CUSTOM_SECONDS,
        }
    }
}

/// Workout session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name given to a session started without a template
    pub default_name: String,
    /// Name saved when the user cleared the session name
    pub fallback_name: String,
    pub recent_exercise_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_name: "New workout".to_string(),
            fallback_name: "Workout".to_string(),
            recent_exercise_limit: 4,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with AF__ prefix
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file
        dotenvy::dotenv().ok();

        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            .add_source(config::File::with_name(&config_file).required(false))
            // e.g., AF__TIMER__DEFAULT_SECONDS=120 sets timer.default_seconds
            .add_source(config::Environment::with_prefix("AF").separator("__"))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::Cloud && self.cloud.project_id.trim().is_empty() {
            bail!("cloud.project_id is required when storage.backend = \"cloud\"");
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.sqlite_url.is_empty() {
            bail!("storage.sqlite_url is required when storage.backend = \"sqlite\"");
        }
        if self.timer.max_custom_seconds == 0 || self.timer.max_custom_seconds > MAX_CUSTOM_SECONDS {
            bail!("timer.max_custom_seconds must be between 1 and {}", MAX_CUSTOM_SECONDS);
        }
        if !(1..=self.timer.max_custom_seconds).contains(&self.timer.default_seconds) {
            bail!(
                "timer.default_seconds must be between 1 and {}",
                self.timer.max_custom_seconds
            );
        }
        if self.timer.presets.is_empty() || self.timer.presets.contains(&0) {
            bail!("timer.presets must be a non-empty list of positive durations");
        }
        Ok(())
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.timer.default_seconds, 90);
        assert_eq!(config.timer.presets, vec![30, 60, 90, 120, 180]);
        assert_eq!(config.timer.max_custom_seconds, 600);
        assert_eq!(config.session.recent_exercise_limit, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cloud_backend_requires_project() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Cloud;
        assert!(config.validate().is_err());

        config.cloud.project_id = "appfitness-dev".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timer_default_must_fit_custom_range() {
        let mut config = AppConfig::default();
        config.timer.default_seconds = 900;
        assert!(config.validate().is_err());

        config.timer.default_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[timer]\ndefault_seconds = 120\n\n[storage]\nbackend = \"memory\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.timer.default_seconds, 120);
        assert_eq!(config.timer.presets, vec![30, 60, 90, 120, 180]);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.session.default_name, "New workout");
    }

    #[test]
    fn test_is_production() {
        // Default should be false (development)
        assert!(!AppConfig::is_production());
    }
}
