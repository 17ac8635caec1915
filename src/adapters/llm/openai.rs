//! OpenAI backend - chat completions API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAiConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let adapter = GenerationPipeline::new(OpenAiBackend::new(config)?);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use std::time::Duration;
use tracing::info;

use super::chat_completions::{self, ChatCompletionRequest};
use super::http::build_client;
use crate::config::{Credential, LlmConfig, ValidationError, DEFAULT_MAX_TOKENS};
use crate::domain::conversation::Message;
use crate::ports::{BackendError, ProviderBackend};

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: OPENAI_DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            temperature: 0.7,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(30),
        }
    }

    /// Builds the configuration from application settings.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no OpenAI key is configured
    pub fn from_settings(settings: &LlmConfig) -> Result<Self, ValidationError> {
        let api_key = settings.require_credential("openai", Credential::OpenAi)?;
        let mut config = Self::new(api_key)
            .with_model(settings.model_or(OPENAI_DEFAULT_MODEL))
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens_or_default())
            .with_timeout(settings.timeout());
        if let Some(url) = &settings.openai_base_url {
            config = config.with_base_url(url.clone());
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiBackend {
    /// Creates the backend.
    ///
    /// # Errors
    ///
    /// - `HttpClient` if the HTTP client cannot be built
    pub fn new(config: OpenAiConfig) -> Result<Self, ValidationError> {
        let client = build_client(config.timeout)?;
        info!(provider = "openai", model = %config.model, "backend initialized");
        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl ProviderBackend for OpenAiBackend {
    type Request = ChatCompletionRequest;

    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn format(&self, history: &[Message], system_prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: chat_completions::chat_messages(history, system_prompt),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: None,
        }
    }

    async fn invoke(&self, request: ChatCompletionRequest) -> Result<String, BackendError> {
        chat_completions::complete(
            &self.client,
            &self.completions_url(),
            &self.config.api_key,
            &request,
            self.config.timeout.as_secs(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::new("sk-test".to_string())
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAiConfig::new(key())
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com/v1/")
            .with_timeout(Duration::from_secs(10))
            .with_max_tokens(200);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_tokens, 200);
    }

    #[test]
    fn from_settings_requires_key() {
        let err = OpenAiConfig::from_settings(&LlmConfig::default()).unwrap_err();
        assert!(err.is_missing_credential());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn from_settings_applies_defaults() {
        let settings = LlmConfig {
            openai_api_key: Some(key()),
            ..Default::default()
        };
        let config = OpenAiConfig::from_settings(&settings).unwrap();
        assert_eq!(config.model, OPENAI_DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn format_builds_flat_list_with_system_first() {
        let backend = OpenAiBackend::new(OpenAiConfig::new(key())).unwrap();
        let request = backend.format(&[Message::user("hello")], "SYSTEM");

        assert_eq!(request.model, OPENAI_DEFAULT_MODEL);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert!(request.stream.is_none());
    }
}
