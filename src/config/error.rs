//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
/// or adapter construction
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Missing credential for provider '{provider}': set {env_var}")]
    MissingCredential {
        provider: String,
        env_var: &'static str,
    },

    #[error("Temperature {0} is outside the allowed range 0.0..=2.0")]
    InvalidTemperature(f32),

    #[error("max_tokens must be greater than zero")]
    InvalidMaxTokens,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("HTTP client could not be built: {0}")]
    HttpClient(String),
}

impl ValidationError {
    /// Creates a missing credential error.
    pub fn missing_credential(provider: impl Into<String>, env_var: &'static str) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
            env_var,
        }
    }

    /// Returns true if a provider credential was absent.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_the_env_var() {
        let err = ValidationError::missing_credential("gemini", "PEDIATRIC_CHAT__LLM__GEMINI_API_KEY");
        assert!(err.is_missing_credential());
        assert_eq!(
            err.to_string(),
            "Missing credential for provider 'gemini': set PEDIATRIC_CHAT__LLM__GEMINI_API_KEY"
        );
    }

    #[test]
    fn validation_error_wraps_into_config_error() {
        let err: ConfigError = ValidationError::InvalidTemperature(3.5).into();
        assert!(err.to_string().contains("3.5"));
    }
}
