//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PEDIATRIC_CHAT` prefix and nested values use double underscores as separators.
//!
//! The loaded value is passed explicitly to whatever needs it; there is no
//! global settings singleton.
//!
//! # Example
//!
//! ```no_run
//! use pediatric_chat::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Active provider: {}", config.llm.provider_name());
//! ```

mod error;
mod llm;
mod logging;
mod redis;

pub use error::{ConfigError, ValidationError};
pub use llm::{Credential, LlmConfig, BUILTIN_PROVIDERS, DEFAULT_MAX_TOKENS};
pub use logging::{LogFormat, LoggingConfig};
pub use self::redis::{RedisConfig, StorageBackend, StorageConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Conversation storage selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Redis configuration (used when storage backend is redis)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Log filter and output format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PEDIATRIC_CHAT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PEDIATRIC_CHAT__LLM__PROVIDER=gemini` -> `llm.provider = "gemini"`
    /// - `PEDIATRIC_CHAT__REDIS__URL=...` -> `redis.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PEDIATRIC_CHAT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Must run before any adapter is built.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.llm.validate()?;
        if self.storage.backend == StorageBackend::Redis {
            self.redis.validate()?;
        }
        Ok(())
    }
}
