//! Provider backend port - the backend-specific steps of generation.
//!
//! Every backend contributes exactly two steps to the shared generation
//! pipeline:
//!
//! - `format` translates the turn history and the composed system prompt into
//!   the backend's own request shape
//! - `invoke` performs the network or in-process inference call and returns
//!   the raw reply text
//!
//! Everything else (safety, context, phase, prompt, validation, fallback) is
//! shared and lives in the pipeline, so backends stay small.

use async_trait::async_trait;

use crate::domain::conversation::Message;

/// Backend-specific half of the generation pipeline.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Backend-specific request payload produced by `format`.
    type Request: Send + 'static;

    /// Registry name of the backend (e.g. "gemini").
    fn name(&self) -> &'static str;

    /// Model identifier sent to the backend.
    fn model(&self) -> &str;

    /// Translates history and system prompt into the backend's request shape.
    fn format(&self, history: &[Message], system_prompt: &str) -> Self::Request;

    /// Calls the backend and returns its raw reply text.
    async fn invoke(&self, request: Self::Request) -> Result<String, BackendError>;
}

/// Backend call failures.
///
/// These never leave the adapter: the pipeline logs them and returns the
/// fallback reply instead.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Request exceeded the configured timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Transport-level failure (DNS, connect, TLS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Response decoded but carried no candidate reply.
    #[error("backend returned no content")]
    EmptyResponse,

    /// Local inference worker has shut down.
    #[error("local inference worker unavailable")]
    WorkerUnavailable,

    /// Local model failed while generating.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl BackendError {
    /// Creates an HTTP status error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an inference error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Returns true if the call was abandoned because of the timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Short, stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Http { .. } => "http_status",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::EmptyResponse => "empty_response",
            Self::WorkerUnavailable => "worker_unavailable",
            Self::Inference(_) => "inference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguished_from_http_failure() {
        let timeout = BackendError::Timeout { timeout_secs: 30 };
        let http = BackendError::http(503, "overloaded");

        assert!(timeout.is_timeout());
        assert!(!http.is_timeout());
        assert_eq!(timeout.kind(), "timeout");
        assert_eq!(http.kind(), "http_status");
    }

    #[test]
    fn errors_display_their_context() {
        assert_eq!(
            BackendError::Timeout { timeout_secs: 30 }.to_string(),
            "request timed out after 30s"
        );
        assert_eq!(
            BackendError::http(429, "slow down").to_string(),
            "backend returned HTTP 429: slow down"
        );
        assert_eq!(BackendError::parse("bad json").to_string(), "parse error: bad json");
    }
}
