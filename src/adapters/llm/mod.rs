//! LLM adapters.
//!
//! One shared [`GenerationPipeline`] composed with a backend per provider.
//!
//! ## Available Backends
//!
//! - `OpenAiBackend` - OpenAI chat completions
//! - `GeminiBackend` - Google Gemini `generateContent`
//! - `DeepSeekBackend` - DeepSeek (OpenAI-compatible)
//! - `AnthropicBackend` - Anthropic Messages
//! - `LocalBackend` - Local model on a dedicated worker thread
//! - `MockBackend` - Configurable mock for testing
//!
//! `AdapterRegistry` maps provider names to constructors for all of them.

mod anthropic;
mod chat_completions;
mod deepseek;
mod gemini;
mod http;
mod local;
pub mod mock;
mod openai;
mod pipeline;
mod registry;

/// Opening user turn for backends that reject a conversation without one.
pub(crate) const SEED_USER_TURN: &str = "Hello";

pub use anthropic::{AnthropicBackend, ANTHROPIC_DEFAULT_MODEL};
pub use chat_completions::{ChatCompletionRequest, ChatMessage};
pub use deepseek::{DeepSeekBackend, DEEPSEEK_DEFAULT_MODEL};
pub use gemini::{GeminiBackend, GeminiRequest, GEMINI_DEFAULT_MODEL};
pub use local::{
    transcript, GenerationParams, LocalBackend, LocalModel, OllamaModel, LOCAL_DEFAULT_MODEL,
};
pub use mock::{MockBackend, MockError, MockReply, MockRequest};
pub use openai::{OpenAiBackend, OpenAiConfig, OPENAI_DEFAULT_MODEL};
pub use pipeline::{fallback_message, GenerationPipeline, FALLBACK_MESSAGE};
pub use registry::{AdapterConstructor, AdapterRegistry, ProviderStatus, RegistryError};
