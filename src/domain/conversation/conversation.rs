//! Conversation aggregate.
//!
//! A conversation is an ordered, append-only list of turns. Insertion order is
//! chronological order and is preserved exactly on every read.

use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, Timestamp};
use serde::{Deserialize, Serialize};

use super::message::Message;

/// Conversation aggregate root.
///
/// # Invariants
///
/// - Messages are only ever appended
/// - Message timestamps are non-decreasing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    messages: Vec<Message>,
    created_at: Timestamp,
}

impl Conversation {
    /// Starts a new, empty conversation.
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Reconstitutes a conversation from persistence.
    pub fn reconstitute(
        id: ConversationId,
        messages: Vec<Message>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            messages,
            created_at,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns the turns in chronological order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends a turn.
    ///
    /// # Errors
    ///
    /// - `OutOfOrderMessage` if the message is older than the last turn
    pub fn append(&mut self, message: Message) -> Result<(), DomainError> {
        if let Some(last) = self.messages.last() {
            if message.timestamp().is_before(last.timestamp()) {
                return Err(DomainError::new(
                    ErrorCode::OutOfOrderMessage,
                    "Message is older than the last turn in the conversation",
                )
                .with_detail("message_id", message.id().to_string()));
            }
        }
        self.messages.push(message);
        Ok(())
    }

    /// Builds a lightweight listing entry.
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            message_count: self.messages.len(),
            created_at: self.created_at,
            last_activity: self
                .messages
                .last()
                .map(|m| *m.timestamp())
                .unwrap_or(self.created_at),
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Listing entry returned by `ConversationRepository::list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub message_count: usize,
    pub created_at: Timestamp,
    pub last_activity: Timestamp,
}
