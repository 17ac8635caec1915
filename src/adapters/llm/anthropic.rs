//! Anthropic backend - Claude Messages API.
//!
//! Anthropic keeps the system prompt out of the message list and requires the
//! conversation to open with a user turn.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use super::http::{build_client, map_send_error, read_json};
use super::SEED_USER_TURN;
use crate::config::{Credential, LlmConfig, ValidationError};
use crate::domain::conversation::Message;
use crate::ports::{BackendError, ProviderBackend};

pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Request body for `POST /v1/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<AnthropicMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    api_key: SecretString,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    client: Client,
}

impl AnthropicBackend {
    /// Creates the backend from application settings.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no Anthropic key is configured
    /// - `HttpClient` if the HTTP client cannot be built
    pub fn from_settings(settings: &LlmConfig) -> Result<Self, ValidationError> {
        let api_key = settings.require_credential("anthropic", Credential::Anthropic)?;
        let timeout = settings.timeout();
        let backend = Self {
            api_key,
            model: settings.model_or(ANTHROPIC_DEFAULT_MODEL),
            base_url: settings
                .anthropic_base_url
                .as_deref()
                .unwrap_or(ANTHROPIC_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            // Anthropic caps temperature at 1.0.
            temperature: settings.temperature.min(1.0),
            max_tokens: settings.max_tokens_or_default(),
            timeout,
            client: build_client(timeout)?,
        };
        info!(provider = "anthropic", model = %backend.model, "backend initialized");
        Ok(backend)
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl ProviderBackend for AnthropicBackend {
    type Request = AnthropicRequest;

    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn format(&self, history: &[Message], system_prompt: &str) -> AnthropicRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if history.first().map_or(true, |m| !m.is_user()) {
            messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: SEED_USER_TURN.to_string(),
            });
        }
        messages.extend(history.iter().map(|m| AnthropicMessage {
            role: m.role().as_str().to_string(),
            content: m.content().to_string(),
        }));

        AnthropicRequest {
            model: self.model.clone(),
            system: system_prompt.to_string(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    async fn invoke(&self, request: AnthropicRequest) -> Result<String, BackendError> {
        let timeout_secs = self.timeout.as_secs();
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout_secs))?;

        let body: AnthropicResponse = read_json(response, timeout_secs).await?;
        if body.content.is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(body
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}
