//! Pediatric Chat - Conversational pediatric triage backend
//!
//! A parent describes a child's symptoms over several turns and the assistant
//! replies through whichever LLM provider is configured. Every provider runs
//! behind the same generation pipeline: emergency interception, context
//! analysis, phase classification, prompt composition, the backend call, and
//! a response corrector that keeps exactly one question per reply.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
