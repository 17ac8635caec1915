//! LLM adapter port - what the rest of the system calls to get a reply.
//!
//! An adapter takes the ordered turn history of a conversation and returns the
//! next assistant turn. The contract never fails: every internal error is
//! converted to a static fallback reply inside the adapter.
//!
//! # Example
//!
//! ```ignore
//! let reply = adapter.generate(conversation.messages()).await;
//! assert!(reply.is_assistant());
//! ```

use async_trait::async_trait;

use crate::domain::conversation::Message;

/// Port for generating the next assistant turn.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Produces the next assistant message for `history`.
    ///
    /// `history` is in chronological order and is never reordered.
    async fn generate(&self, history: &[Message]) -> Message;

    /// Registry name of the backend behind this adapter (e.g. "openai").
    fn provider_name(&self) -> &str;

    /// Model identifier used by the backend.
    fn model(&self) -> &str;
}
