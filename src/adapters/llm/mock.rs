//! Mock backend for testing.
//!
//! Provides a configurable `ProviderBackend` so the shared pipeline can be
//! exercised without calling real LLM APIs.
//!
//! # Features
//!
//! - Pre-configured replies (consumed in order)
//! - Simulated delays
//! - Error injection for fallback testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let backend = MockBackend::new().with_response("What is the child's age?");
//! let adapter = GenerationPipeline::new(backend.clone());
//!
//! let reply = adapter.generate(&[]).await;
//! assert_eq!(backend.call_count(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::conversation::Message;
use crate::ports::{BackendError, ProviderBackend};

/// Reply returned once the queue is exhausted.
pub const DEFAULT_MOCK_REPLY: &str = "Mock response";

/// Mock backend for testing.
///
/// Clones share the reply queue and the call log, so a test can keep one
/// handle while the pipeline owns another.
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Pre-configured replies (consumed in order).
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    /// Simulated latency per call.
    delay: Duration,
    /// Recorded `invoke` calls.
    calls: Arc<Mutex<Vec<MockRequest>>>,
}

/// Request produced by `MockBackend::format`.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub system_prompt: String,
    pub history: Vec<Message>,
}

/// A configured mock reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate a request timeout.
    Timeout { timeout_secs: u64 },
    /// Simulate a non-success HTTP status.
    Http { status: u16 },
    /// Simulate a transport failure.
    Network { message: String },
    /// Simulate an undecodable response.
    Parse { message: String },
}

impl From<MockError> for BackendError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::Timeout { timeout_secs } => BackendError::Timeout { timeout_secs },
            MockError::Http { status } => BackendError::http(status, "mock failure"),
            MockError::Network { message } => BackendError::network(message),
            MockError::Parse { message } => BackendError::parse(message),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Creates a new mock backend with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful reply to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockReply::Text(content.into()));
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockReply::Error(error));
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of backend calls made.
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<MockRequest> {
        self.lock_calls().clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.lock_calls().clear();
    }

    fn push(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockRequest>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Gets the next reply or the default.
    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| MockReply::Text(DEFAULT_MOCK_REPLY.to_string()))
    }
}

#[async_trait]
impl ProviderBackend for MockBackend {
    type Request = MockRequest;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn format(&self, history: &[Message], system_prompt: &str) -> MockRequest {
        MockRequest {
            system_prompt: system_prompt.to_string(),
            history: history.to_vec(),
        }
    }

    async fn invoke(&self, request: MockRequest) -> Result<String, BackendError> {
        self.lock_calls().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> MockRequest {
        MockBackend::new().format(&[Message::user("hi")], "system")
    }

    #[tokio::test]
    async fn returns_replies_in_order() {
        let backend = MockBackend::new().with_response("first").with_response("second");

        assert_eq!(backend.invoke(request()).await.unwrap(), "first");
        assert_eq!(backend.invoke(request()).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn returns_default_after_exhausted() {
        let backend = MockBackend::new();
        assert_eq!(backend.invoke(request()).await.unwrap(), DEFAULT_MOCK_REPLY);
    }

    #[tokio::test]
    async fn returns_configured_error() {
        let backend = MockBackend::new().with_error(MockError::Http { status: 503 });
        let err = backend.invoke(request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn clones_share_call_log() {
        let backend = MockBackend::new();
        let handle = backend.clone();

        backend.invoke(request()).await.unwrap();

        assert_eq!(handle.call_count(), 1);
        assert_eq!(handle.calls()[0].system_prompt, "system");
        handle.clear_calls();
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn respects_delay() {
        let backend = MockBackend::new().with_delay(Duration::from_millis(20));
        let start = std::time::Instant::now();
        backend.invoke(request()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn mock_error_converts_to_backend_error() {
        let err: BackendError = MockError::Timeout { timeout_secs: 30 }.into();
        assert!(err.is_timeout());
        let err: BackendError = MockError::Parse { message: "bad".into() }.into();
        assert_eq!(err.kind(), "parse");
    }
}
