//! In-memory conversation repository.
//!
//! Stores conversations in memory. Used by the console binary by default and
//! by tests. Listing preserves creation order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{Conversation, ConversationSummary, Message};
use crate::domain::foundation::{ConversationId, DomainError};
use crate::ports::ConversationRepository;

#[derive(Debug, Default)]
struct Store {
    conversations: HashMap<ConversationId, Conversation>,
    order: Vec<ConversationId>,
}

/// In-memory storage for conversations
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryConversationRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        store.conversations.clear();
        store.order.clear();
    }

    /// Get the number of stored conversations
    pub async fn count(&self) -> usize {
        self.store.read().await.order.len()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create(&self, conversation: Conversation) -> Result<Conversation, DomainError> {
        let mut store = self.store.write().await;
        let id = *conversation.id();
        if store.conversations.insert(id, conversation.clone()).is_none() {
            store.order.push(id);
        }
        Ok(conversation)
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError> {
        Ok(self.store.read().await.conversations.get(id).cloned())
    }

    async fn add_message(
        &self,
        id: &ConversationId,
        message: Message,
    ) -> Result<Message, DomainError> {
        let mut store = self.store.write().await;
        let conversation = store
            .conversations
            .get_mut(id)
            .ok_or_else(|| DomainError::conversation_not_found(id))?;
        conversation.append(message.clone())?;
        Ok(message)
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, DomainError> {
        let store = self.store.read().await;
        Ok(store
            .order
            .iter()
            .filter_map(|id| store.conversations.get(id))
            .map(Conversation::summary)
            .collect())
    }
}
