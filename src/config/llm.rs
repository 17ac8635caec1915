//! LLM provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Providers compiled into the default adapter registry.
pub const BUILTIN_PROVIDERS: [&str; 5] = ["openai", "gemini", "deepseek", "anthropic", "local"];

/// Default number of tokens requested from cloud backends.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// API key a provider needs before it can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Credential {
    OpenAi,
    Gemini,
    DeepSeek,
    Anthropic,
}

impl Credential {
    /// Credential required by a built-in provider, if any.
    pub fn for_provider(provider: &str) -> Option<Self> {
        match provider {
            "openai" => Some(Self::OpenAi),
            "gemini" => Some(Self::Gemini),
            "deepseek" => Some(Self::DeepSeek),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }

    /// Environment variable that supplies the credential.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "PEDIATRIC_CHAT__LLM__OPENAI_API_KEY",
            Self::Gemini => "PEDIATRIC_CHAT__LLM__GEMINI_API_KEY",
            Self::DeepSeek => "PEDIATRIC_CHAT__LLM__DEEPSEEK_API_KEY",
            Self::Anthropic => "PEDIATRIC_CHAT__LLM__ANTHROPIC_API_KEY",
        }
    }
}

/// LLM configuration
///
/// Read-only settings passed explicitly to the adapter registry and to every
/// backend constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Active provider name (openai, gemini, deepseek, anthropic, local)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// OpenAI API key
    pub openai_api_key: Option<SecretString>,

    /// Google Gemini API key
    pub gemini_api_key: Option<SecretString>,

    /// DeepSeek API key
    pub deepseek_api_key: Option<SecretString>,

    /// Anthropic API key
    pub anthropic_api_key: Option<SecretString>,

    /// Model override; each provider has its own default
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds for network backends
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Local inference daemon endpoint
    #[serde(default = "default_local_endpoint")]
    pub local_endpoint: String,

    pub openai_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
    pub deepseek_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
}

impl LlmConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Normalized active provider name.
    pub fn provider_name(&self) -> String {
        self.provider.trim().to_lowercase()
    }

    /// Configured model, or the provider's default.
    pub fn model_or(&self, default: &str) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    /// Configured max tokens, or the shared default.
    pub fn max_tokens_or_default(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Returns the credential if present and non-empty.
    pub fn credential(&self, credential: Credential) -> Option<&SecretString> {
        let key = match credential {
            Credential::OpenAi => self.openai_api_key.as_ref(),
            Credential::Gemini => self.gemini_api_key.as_ref(),
            Credential::DeepSeek => self.deepseek_api_key.as_ref(),
            Credential::Anthropic => self.anthropic_api_key.as_ref(),
        };
        key.filter(|k| !k.expose_secret().trim().is_empty())
    }

    /// Check if a credential is configured
    pub fn has_credential(&self, credential: Credential) -> bool {
        self.credential(credential).is_some()
    }

    /// Returns the credential or a configuration error naming it.
    pub fn require_credential(
        &self,
        provider: &str,
        credential: Credential,
    ) -> Result<SecretString, ValidationError> {
        self.credential(credential)
            .cloned()
            .ok_or_else(|| ValidationError::missing_credential(provider, credential.env_var()))
    }

    /// Validate LLM configuration
    ///
    /// Checks the active provider's credential, the temperature range and the
    /// numeric limits. Unknown provider names are reported by the registry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let provider = self.provider_name();
        if provider.is_empty() {
            return Err(ValidationError::MissingRequired("PEDIATRIC_CHAT__LLM__PROVIDER"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature(self.temperature));
        }

        if self.max_tokens == Some(0) {
            return Err(ValidationError::InvalidMaxTokens);
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if let Some(credential) = Credential::for_provider(&provider) {
            self.require_credential(&provider, credential)?;
        }

        if provider == "local"
            && !self.local_endpoint.starts_with("http://")
            && !self.local_endpoint.starts_with("https://")
        {
            return Err(ValidationError::InvalidEndpoint(self.local_endpoint.clone()));
        }

        Ok(())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai_api_key: None,
            gemini_api_key: None,
            deepseek_api_key: None,
            anthropic_api_key: None,
            model: None,
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout(),
            local_endpoint: default_local_endpoint(),
            openai_base_url: None,
            gemini_base_url: None,
            deepseek_base_url: None,
            anthropic_base_url: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    30
}

fn default_local_endpoint() -> String {
    "http://localhost:11434".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            openai_api_key: Some(SecretString::new("sk-test".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_tokens_or_default(), 1000);
        assert_eq!(config.local_endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_timeout_duration() {
        let config = LlmConfig {
            timeout_secs: 10,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_model_override_and_default() {
        let mut config = LlmConfig::default();
        assert_eq!(config.model_or("gpt-4o-mini"), "gpt-4o-mini");
        config.model = Some("  ".to_string());
        assert_eq!(config.model_or("gpt-4o-mini"), "gpt-4o-mini");
        config.model = Some("gpt-4o".to_string());
        assert_eq!(config.model_or("gpt-4o-mini"), "gpt-4o");
    }

    #[test]
    fn test_validation_passes_with_active_key() {
        assert!(with_key("openai").validate().is_ok());
    }

    #[test]
    fn test_validation_missing_active_key_names_env_var() {
        let err = with_key("gemini").validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::missing_credential("gemini", "PEDIATRIC_CHAT__LLM__GEMINI_API_KEY")
        );
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = LlmConfig {
            deepseek_api_key: Some(SecretString::new("   ".to_string())),
            ..Default::default()
        };
        assert!(!config.has_credential(Credential::DeepSeek));
    }

    #[test]
    fn test_validation_rejects_temperature_out_of_range() {
        for temperature in [-0.1, 2.01, f32::NAN] {
            let config = LlmConfig {
                temperature,
                ..with_key("openai")
            };
            assert!(matches!(
                config.validate(),
                Err(ValidationError::InvalidTemperature(_))
            ));
        }
    }

    #[test]
    fn test_validation_accepts_temperature_bounds() {
        for temperature in [0.0, 2.0] {
            let config = LlmConfig {
                temperature,
                ..with_key("openai")
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_local_provider_needs_no_key() {
        let config = LlmConfig {
            provider: "LOCAL".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_local_provider_rejects_bad_endpoint() {
        let config = LlmConfig {
            provider: "local".to_string(),
            local_endpoint: "localhost:11434".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let config = LlmConfig {
            max_tokens: Some(0),
            ..with_key("openai")
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxTokens));

        let config = LlmConfig {
            timeout_secs: 0,
            ..with_key("openai")
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_every_builtin_cloud_provider_has_a_credential() {
        for provider in BUILTIN_PROVIDERS {
            let credential = Credential::for_provider(provider);
            assert_eq!(credential.is_none(), provider == "local", "{}", provider);
        }
    }
}
