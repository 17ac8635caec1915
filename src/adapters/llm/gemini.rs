//! Google Gemini backend - `generateContent` API.
//!
//! Gemini takes a role/parts list where the assistant role is called `model`.
//! The composed system prompt travels separately as `system_instruction`.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use super::http::{build_client, map_send_error, read_json};
use super::SEED_USER_TURN;
use crate::config::{Credential, LlmConfig, ValidationError};
use crate::domain::conversation::{Message, Role};
use crate::ports::{BackendError, ProviderBackend};

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct GeminiRequest {
    pub system_instruction: GeminiContent,
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }
}

/// Gemini's name for a turn role.
fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    api_key: SecretString,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    client: Client,
}

impl GeminiBackend {
    /// Creates the backend from application settings.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no Gemini key is configured
    /// - `HttpClient` if the HTTP client cannot be built
    pub fn from_settings(settings: &LlmConfig) -> Result<Self, ValidationError> {
        let api_key = settings.require_credential("gemini", Credential::Gemini)?;
        let timeout = settings.timeout();
        let backend = Self {
            api_key,
            model: settings.model_or(GEMINI_DEFAULT_MODEL),
            base_url: settings
                .gemini_base_url
                .as_deref()
                .unwrap_or(GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens_or_default(),
            timeout,
            client: build_client(timeout)?,
        };
        info!(provider = "gemini", model = %backend.model, "backend initialized");
        Ok(backend)
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ProviderBackend for GeminiBackend {
    type Request = GeminiRequest;

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn format(&self, history: &[Message], system_prompt: &str) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|m| GeminiContent::text(Some(gemini_role(m.role())), m.content()))
            .collect();
        // generateContent rejects an empty contents list.
        if contents.is_empty() {
            contents.push(GeminiContent::text(Some("user"), SEED_USER_TURN));
        }

        GeminiRequest {
            system_instruction: GeminiContent::text(None, system_prompt),
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        }
    }

    async fn invoke(&self, request: GeminiRequest) -> Result<String, BackendError> {
        let timeout_secs = self.timeout.as_secs();
        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout_secs))?;

        let body: GeminiResponse = read_json(response, timeout_secs).await?;
        let content = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or(BackendError::EmptyResponse)?;

        Ok(content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}
