//! DeepSeek backend - OpenAI-compatible chat completions.
//!
//! Same flat role/content format as OpenAI, sent non-streaming with Bearer
//! authentication to the DeepSeek endpoint.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use std::time::Duration;
use tracing::info;

use super::chat_completions::{self, ChatCompletionRequest};
use super::http::build_client;
use crate::config::{Credential, LlmConfig, ValidationError};
use crate::domain::conversation::Message;
use crate::ports::{BackendError, ProviderBackend};

pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// DeepSeek backend.
#[derive(Debug, Clone)]
pub struct DeepSeekBackend {
    api_key: SecretString,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    client: Client,
}

impl DeepSeekBackend {
    /// Creates the backend from application settings.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no DeepSeek key is configured
    /// - `HttpClient` if the HTTP client cannot be built
    pub fn from_settings(settings: &LlmConfig) -> Result<Self, ValidationError> {
        let api_key = settings.require_credential("deepseek", Credential::DeepSeek)?;
        let timeout = settings.timeout();
        let backend = Self {
            api_key,
            model: settings.model_or(DEEPSEEK_DEFAULT_MODEL),
            base_url: settings
                .deepseek_base_url
                .as_deref()
                .unwrap_or(DEEPSEEK_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens_or_default(),
            timeout,
            client: build_client(timeout)?,
        };
        info!(provider = "deepseek", model = %backend.model, "backend initialized");
        Ok(backend)
    }
}

#[async_trait]
impl ProviderBackend for DeepSeekBackend {
    type Request = ChatCompletionRequest;

    fn name(&self) -> &'static str {
        "deepseek"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn format(&self, history: &[Message], system_prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: chat_completions::chat_messages(history, system_prompt),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: Some(false),
        }
    }

    async fn invoke(&self, request: ChatCompletionRequest) -> Result<String, BackendError> {
        chat_completions::complete(
            &self.client,
            &format!("{}/chat/completions", self.base_url),
            &self.api_key,
            &request,
            self.timeout.as_secs(),
        )
        .await
    }
}
