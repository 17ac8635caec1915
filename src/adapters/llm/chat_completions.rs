//! Chat-completions wire format shared by OpenAI and DeepSeek.
//!
//! Both services accept a flat role/content list with the system prompt as
//! the first entry and authenticate with a Bearer token.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::http::{map_send_error, read_json};
use crate::domain::conversation::Message;
use crate::ports::BackendError;

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// One entry of the flat message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Builds the flat list: system prompt first, then every turn in order.
pub fn chat_messages(history: &[Message], system_prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::new("system", system_prompt));
    messages.extend(
        history
            .iter()
            .map(|m| ChatMessage::new(m.role().as_str(), m.content())),
    );
    messages
}

/// Posts a chat-completions request and returns the first choice's text.
pub(crate) async fn complete(
    client: &Client,
    url: &str,
    api_key: &SecretString,
    request: &ChatCompletionRequest,
    timeout_secs: u64,
) -> Result<String, BackendError> {
    let response = client
        .post(url)
        .bearer_auth(api_key.expose_secret())
        .json(request)
        .send()
        .await
        .map_err(|e| map_send_error(e, timeout_secs))?;

    let body: ChatCompletionResponse = read_json(response, timeout_secs).await?;

    body.choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(BackendError::EmptyResponse)
}
