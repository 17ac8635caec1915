//! Conversation repository port.
//!
//! Defines the contract for persisting conversations and their turns.
//! Implementations handle the actual storage.
//!
//! # Design
//!
//! - **Append-only**: turns are only ever appended, never edited or removed
//! - **Ordered**: insertion order is chronological order and is preserved on read
//! - **Not-found passes through**: callers receive `ConversationNotFound` untouched

use crate::domain::conversation::{Conversation, ConversationSummary, Message};
use crate::domain::foundation::{ConversationId, DomainError};
use async_trait::async_trait;

/// Repository port for conversation persistence.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Stores a new conversation and returns the stored value.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` / `CacheError` on persistence failure
    async fn create(&self, conversation: Conversation) -> Result<Conversation, DomainError>;

    /// Finds a conversation by its ID, including all turns.
    ///
    /// Returns `None` if not found.
    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError>;

    /// Appends a turn to an existing conversation.
    ///
    /// # Errors
    ///
    /// - `ConversationNotFound` if the conversation doesn't exist
    /// - `OutOfOrderMessage` if the turn is older than the last one
    /// - `DatabaseError` / `CacheError` on persistence failure
    async fn add_message(
        &self,
        id: &ConversationId,
        message: Message,
    ) -> Result<Message, DomainError>;

    /// Lists summaries of every stored conversation, oldest first.
    async fn list(&self) -> Result<Vec<ConversationSummary>, DomainError>;
}
