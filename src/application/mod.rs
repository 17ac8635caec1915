//! Application layer - Use cases over the domain and ports.
//!
//! The service here is what an HTTP or console front end would call.

mod conversation_service;

pub use conversation_service::ConversationService;
