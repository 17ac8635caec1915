//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `conversation` - Conversation aggregate and the generation policy stages
//!   (safety, context, phase, prompt, validation)

pub mod conversation;
pub mod foundation;
