//! Conversation service.
//!
//! Orchestrates one exchange: persist the user turn, run the active adapter
//! over the full history, persist and return the assistant reply.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::conversation::{Conversation, ConversationSummary, Message};
use crate::domain::foundation::{ConversationId, DomainError};
use crate::ports::{ConversationRepository, LlmAdapter};

/// Application entry point for conversations.
#[derive(Clone)]
pub struct ConversationService {
    repository: Arc<dyn ConversationRepository>,
    adapter: Arc<dyn LlmAdapter>,
}

impl ConversationService {
    pub fn new(repository: Arc<dyn ConversationRepository>, adapter: Arc<dyn LlmAdapter>) -> Self {
        Self {
            repository,
            adapter,
        }
    }

    /// The adapter replies are generated with.
    pub fn adapter(&self) -> &Arc<dyn LlmAdapter> {
        &self.adapter
    }

    /// Starts a new, empty conversation.
    pub async fn create_conversation(&self) -> Result<Conversation, DomainError> {
        let conversation = self.repository.create(Conversation::new()).await?;
        info!(conversation_id = %conversation.id(), "conversation created");
        Ok(conversation)
    }

    /// Handles one user turn and returns the assistant reply.
    ///
    /// The adapter never fails; only persistence errors surface here.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `content` is empty or whitespace only
    /// - `ConversationNotFound` if the conversation does not exist
    pub async fn handle_message(
        &self,
        id: &ConversationId,
        content: &str,
    ) -> Result<Message, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation(
                "content",
                "Message content cannot be empty",
            ));
        }

        let conversation = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::conversation_not_found(id))?;

        let user_message = self
            .repository
            .add_message(id, Message::user(content))
            .await?;

        let mut history = conversation.messages().to_vec();
        history.push(user_message);

        debug!(
            conversation_id = %id,
            turns = history.len(),
            provider = self.adapter.provider_name(),
            "generating reply"
        );
        let reply = self.adapter.generate(&history).await;

        self.repository.add_message(id, reply).await
    }

    /// Returns the turns of a conversation in chronological order.
    ///
    /// # Errors
    ///
    /// - `ConversationNotFound` if the conversation does not exist
    pub async fn get_history(&self, id: &ConversationId) -> Result<Vec<Message>, DomainError> {
        self.repository
            .get(id)
            .await?
            .map(|c| c.messages().to_vec())
            .ok_or_else(|| DomainError::conversation_not_found(id))
    }

    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, DomainError> {
        self.repository.list().await
    }
}
