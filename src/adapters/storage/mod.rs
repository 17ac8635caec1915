//! Conversation storage adapters.
//!
//! - `InMemoryConversationRepository` - Process-local storage (default, tests)
//! - `RedisConversationRepository` - Redis-backed storage for multi-process deployments

mod in_memory;
mod redis;

pub use in_memory::InMemoryConversationRepository;
pub use self::redis::RedisConversationRepository;
