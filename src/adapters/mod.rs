//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `llm` - Generation pipeline and provider backends (OpenAI, Gemini, DeepSeek, Anthropic, local)
//! - `storage` - Conversation repositories (in-memory, Redis)

pub mod llm;
pub mod storage;

pub use llm::{AdapterRegistry, GenerationPipeline, MockBackend, RegistryError};
pub use storage::{InMemoryConversationRepository, RedisConversationRepository};
