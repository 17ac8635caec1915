//! Conversation domain module.
//!
//! Holds the conversation aggregate and the backend-agnostic policy stages
//! shared by every provider adapter: emergency interception, context
//! analysis, phase classification, prompt composition and response
//! validation.

mod context;
mod conversation;
mod message;
mod phase;
mod prompts;
mod safety;
mod validator;

pub use context::{ContextAnalyzer, ContextInfo, Symptom};
pub use conversation::{Conversation, ConversationSummary};
pub use message::{Message, Role};
pub use phase::ConversationPhase;
pub use prompts::{
    required_question, symptom_questions, PromptComposer, AGE_QUESTION, CLOSING_QUESTION,
    EMPATHY_OPENER, INTENSITY_QUESTION, MAIN_SYMPTOM_QUESTION, MORE_DETAIL_QUESTION,
    ONSET_QUESTION, OPENER,
};
pub use safety::{SafetyInterceptor, EMERGENCY_DISCLAIMER, EMERGENCY_RULES};
pub use validator::{canned_reply, fallback_question, ResponseValidator};
