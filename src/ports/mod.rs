//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Generation Ports
//!
//! - `LlmAdapter` - Produces the next assistant turn; never fails
//! - `ProviderBackend` - Backend-specific `format` and `invoke` steps
//!
//! ## Persistence Ports
//!
//! - `ConversationRepository` - Append-only conversation storage

mod conversation_repository;
mod llm_adapter;
mod provider_backend;

pub use conversation_repository::ConversationRepository;
pub use llm_adapter::LlmAdapter;
pub use provider_backend::{BackendError, ProviderBackend};
