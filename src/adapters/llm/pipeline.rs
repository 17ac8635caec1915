//! Generation pipeline - the fixed call sequence shared by every backend.
//!
//! ```text
//! history ─► SafetyInterceptor ─┬─► advisory (no backend call)
//!                               └─► ContextAnalyzer ─► ConversationPhase
//!                                   ─► PromptComposer ─► backend.format
//!                                   ─► backend.invoke ─► ResponseValidator ─► reply
//! ```
//!
//! Backends only supply `format` and `invoke`. Any failure in the sequence is
//! logged and replaced with [`FALLBACK_MESSAGE`], so `generate` always returns
//! an assistant message.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::domain::conversation::{
    ContextAnalyzer, ConversationPhase, Message, PromptComposer, ResponseValidator,
    SafetyInterceptor,
};
use crate::ports::{BackendError, LlmAdapter, ProviderBackend};

/// Static reply used whenever generation fails.
pub const FALLBACK_MESSAGE: &str = "I'm sorry, I can't process your question right now. \
For your child's safety, please contact your pediatrician directly, or call your local \
emergency number if this is an emergency.";

/// Builds the fallback assistant message.
pub fn fallback_message() -> Message {
    Message::assistant(FALLBACK_MESSAGE)
}

/// Adapter composed from the shared pipeline and one backend.
#[derive(Debug, Clone)]
pub struct GenerationPipeline<B> {
    backend: B,
}

impl<B: ProviderBackend> GenerationPipeline<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The backend supplying `format` and `invoke`.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn run(&self, history: &[Message]) -> Result<Message, BackendError> {
        if let Some(advisory) = SafetyInterceptor::check(history) {
            warn!(
                provider = self.backend.name(),
                "emergency phrase detected; returning advisory without backend call"
            );
            return Ok(advisory);
        }

        let info = ContextAnalyzer::analyze(history);
        let phase = ConversationPhase::classify(history);
        info!(
            provider = self.backend.name(),
            phase = phase.label(),
            has_age = info.has_age,
            has_symptom = info.has_symptom,
            "generating reply"
        );

        let system_prompt = PromptComposer::compose(history, phase, &info);
        let request = self.backend.format(history, &system_prompt);
        let raw = self.backend.invoke(request).await?;
        debug!(provider = self.backend.name(), chars = raw.len(), "backend replied");

        Ok(Message::assistant(ResponseValidator::correct(
            &raw, phase, &info,
        )))
    }
}

#[async_trait]
impl<B: ProviderBackend> LlmAdapter for GenerationPipeline<B> {
    async fn generate(&self, history: &[Message]) -> Message {
        match self.run(history).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(
                    provider = self.backend.name(),
                    model = self.backend.model(),
                    kind = err.kind(),
                    timeout = err.is_timeout(),
                    error = %err,
                    "backend call failed; returning fallback reply"
                );
                fallback_message()
            }
        }
    }

    fn provider_name(&self) -> &str {
        self.backend.name()
    }

    fn model(&self) -> &str {
        self.backend.model()
    }
}
