//! Redis-backed conversation repository.
//!
//! Layout per conversation:
//!
//! - `<prefix>:<id>` hash with `created_at` (RFC 3339) and `last_micros`,
//!   the timestamp of the newest turn
//! - `<prefix>:<id>:messages` list of turn JSON documents, oldest first
//!
//! A sorted set `<prefix>:index`, scored by creation time, backs `list()`.
//! Appends run as a Lua script so the existence check, the ordering check
//! and the `RPUSH` happen atomically; concurrent writers never overwrite
//! each other's turns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use tracing::{debug, info};

use crate::config::RedisConfig;
use crate::domain::conversation::{Conversation, ConversationSummary, Message};
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, Timestamp};
use crate::ports::ConversationRepository;

/// KEYS[1] = conversation hash, KEYS[2] = message list,
/// ARGV[1] = message JSON, ARGV[2] = message timestamp in microseconds.
///
/// Returns the new list length, -1 if the conversation does not exist,
/// or -2 if the message is older than the newest stored turn.
const APPEND_MESSAGE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return -1
end
local last = tonumber(redis.call('HGET', KEYS[1], 'last_micros') or '0')
if tonumber(ARGV[2]) < last then
  return -2
end
redis.call('HSET', KEYS[1], 'last_micros', ARGV[2])
return redis.call('RPUSH', KEYS[2], ARGV[1])
"#;

const NOT_FOUND: i64 = -1;
const OUT_OF_ORDER: i64 = -2;

fn cache_error(e: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, format!("Redis error: {}", e))
}

fn serialization_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::InternalError,
        format!("Conversation serialization failed: {}", e),
    )
}

fn conversation_key(prefix: &str, id: &ConversationId) -> String {
    format!("{}:{}", prefix, id)
}

fn messages_key(prefix: &str, id: &ConversationId) -> String {
    format!("{}:{}:messages", prefix, id)
}

fn index_key(prefix: &str) -> String {
    format!("{}:index", prefix)
}

fn micros(timestamp: &Timestamp) -> i64 {
    timestamp.as_datetime().timestamp_micros()
}

/// Rebuilds a conversation from its hash field and message list.
fn decode_conversation(
    id: ConversationId,
    created_at: Option<String>,
    raw_messages: Vec<String>,
) -> Result<Option<Conversation>, DomainError> {
    let Some(created_at) = created_at else {
        return Ok(None);
    };
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| Timestamp::from_datetime(dt.with_timezone(&Utc)))
        .map_err(serialization_error)?;

    let messages = raw_messages
        .iter()
        .map(|raw| serde_json::from_str::<Message>(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(serialization_error)?;

    Ok(Some(Conversation::reconstitute(id, messages, created_at)))
}

/// Redis repository for multi-process deployments.
#[derive(Clone)]
pub struct RedisConversationRepository {
    conn: MultiplexedConnection,
    key_prefix: String,
    append_script: Script,
}

impl RedisConversationRepository {
    /// Create a repository over an existing connection.
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            append_script: Script::new(APPEND_MESSAGE_SCRIPT),
        }
    }

    /// Connect using the Redis configuration, bounded by its timeout.
    ///
    /// # Errors
    ///
    /// - `CacheError` if the URL is invalid, the connection fails or times out
    pub async fn connect(config: &RedisConfig) -> Result<Self, DomainError> {
        let client = redis::Client::open(config.url.as_str()).map_err(cache_error)?;
        let conn = tokio::time::timeout(config.timeout(), client.get_multiplexed_async_connection())
            .await
            .map_err(|_| {
                DomainError::new(
                    ErrorCode::CacheError,
                    format!("Redis connection timed out after {}s", config.timeout_secs),
                )
            })?
            .map_err(cache_error)?;

        info!(prefix = %config.key_prefix, "connected to Redis conversation store");
        Ok(Self::new(conn, config.key_prefix.clone()))
    }

    async fn load(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError> {
        let mut conn = self.conn.clone();
        let (created_at, raw_messages): (Option<String>, Vec<String>) = redis::pipe()
            .atomic()
            .hget(conversation_key(&self.key_prefix, id), "created_at")
            .lrange(messages_key(&self.key_prefix, id), 0, -1)
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        decode_conversation(*id, created_at, raw_messages)
    }
}

#[async_trait]
impl ConversationRepository for RedisConversationRepository {
    async fn create(&self, conversation: Conversation) -> Result<Conversation, DomainError> {
        let id = conversation.id();
        let encoded = conversation
            .messages()
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(serialization_error)?;
        let last_micros = conversation
            .messages()
            .last()
            .map(|m| micros(m.timestamp()))
            .unwrap_or(0);
        let list_key = messages_key(&self.key_prefix, id);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(
                conversation_key(&self.key_prefix, id),
                &[
                    ("created_at", conversation.created_at().as_datetime().to_rfc3339()),
                    ("last_micros", last_micros.to_string()),
                ],
            )
            .ignore()
            .del(&list_key)
            .ignore();
        if !encoded.is_empty() {
            pipe.rpush(&list_key, encoded).ignore();
        }
        pipe.zadd(
            index_key(&self.key_prefix),
            id.to_string(),
            conversation.created_at().as_datetime().timestamp_millis(),
        )
        .ignore();

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(cache_error)?;

        debug!(conversation_id = %id, "conversation stored");
        Ok(conversation)
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError> {
        self.load(id).await
    }

    async fn add_message(
        &self,
        id: &ConversationId,
        message: Message,
    ) -> Result<Message, DomainError> {
        let json = serde_json::to_string(&message).map_err(serialization_error)?;

        let mut conn = self.conn.clone();
        let outcome: i64 = self
            .append_script
            .key(conversation_key(&self.key_prefix, id))
            .key(messages_key(&self.key_prefix, id))
            .arg(json)
            .arg(micros(message.timestamp()))
            .invoke_async(&mut conn)
            .await
            .map_err(cache_error)?;

        match outcome {
            NOT_FOUND => Err(DomainError::conversation_not_found(id)),
            OUT_OF_ORDER => Err(DomainError::new(
                ErrorCode::OutOfOrderMessage,
                "Message is older than the last turn in the conversation",
            )
            .with_detail("message_id", message.id().to_string())),
            _ => Ok(message),
        }
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, DomainError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn
            .zrange(index_key(&self.key_prefix), 0, -1)
            .await
            .map_err(cache_error)?;

        let mut summaries = Vec::with_capacity(ids.len());
        for raw in ids {
            let id: ConversationId = match raw.parse() {
                Ok(id) => id,
                Err(_) => {
                    debug!(entry = %raw, "skipping malformed index entry");
                    continue;
                }
            };
            if let Some(conversation) = self.load(&id).await? {
                summaries.push(conversation.summary());
            }
        }
        Ok(summaries)
    }
}
