//! Conversation phases.
//!
//! The phase is derived fresh on every call from the number of user turns in
//! the history and is never persisted. It decides which directive and which
//! mandatory question go into the system prompt.

use serde::{Deserialize, Serialize};

use super::message::Message;

/// Coarse conversational stage driving prompt content.
///
/// Buckets by user-turn count: 0 → `Initial`, 1–2 → `Discovery`,
/// 3–5 → `Assessment`, 6+ → `Guidance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// No user turn yet; the assistant opens and asks for the child's age.
    Initial,
    /// Collecting the basics: age, main symptom, first symptom detail.
    Discovery,
    /// Probing intensity, duration and behaviour.
    Assessment,
    /// Enough information to give educational guidance.
    Guidance,
}

impl ConversationPhase {
    /// Classifies a history by counting its user turns.
    pub fn classify(history: &[Message]) -> Self {
        let user_turns = history.iter().filter(|m| m.is_user()).count();
        Self::from_user_turns(user_turns)
    }

    /// Maps a user-turn count onto its phase bucket.
    pub fn from_user_turns(user_turns: usize) -> Self {
        match user_turns {
            0 => Self::Initial,
            1..=2 => Self::Discovery,
            3..=5 => Self::Assessment,
            _ => Self::Guidance,
        }
    }

    /// Upper-case label embedded in the system prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::Discovery => "DISCOVERY",
            Self::Assessment => "ASSESSMENT",
            Self::Guidance => "GUIDANCE",
        }
    }

    /// Returns true if the reply must carry the single resolved question.
    pub fn requires_specific_question(&self) -> bool {
        matches!(self, Self::Initial | Self::Discovery)
    }
}

impl Default for ConversationPhase {
    fn default() -> Self {
        Self::Initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn history_with_user_turns(n: usize) -> Vec<Message> {
        let mut history = Vec::new();
        for i in 0..n {
            history.push(Message::user(format!("turn {}", i)));
            history.push(Message::assistant("ok"));
        }
        history
    }

    mod buckets {
        use super::*;

        #[test]
        fn empty_history_is_initial() {
            assert_eq!(ConversationPhase::classify(&[]), ConversationPhase::Initial);
        }

        #[test]
        fn assistant_only_history_is_initial() {
            let history = vec![Message::assistant("Hello")];
            assert_eq!(
                ConversationPhase::classify(&history),
                ConversationPhase::Initial
            );
        }

        #[test]
        fn boundaries_match_bucket_table() {
            let expected = [
                (0, ConversationPhase::Initial),
                (1, ConversationPhase::Discovery),
                (2, ConversationPhase::Discovery),
                (3, ConversationPhase::Assessment),
                (5, ConversationPhase::Assessment),
                (6, ConversationPhase::Guidance),
                (20, ConversationPhase::Guidance),
            ];
            for (turns, phase) in expected {
                assert_eq!(
                    ConversationPhase::classify(&history_with_user_turns(turns)),
                    phase,
                    "{} user turns",
                    turns
                );
            }
        }

        #[test]
        fn assistant_turns_do_not_count() {
            let mut history = history_with_user_turns(2);
            for _ in 0..10 {
                history.push(Message::assistant("filler"));
            }
            assert_eq!(
                ConversationPhase::classify(&history),
                ConversationPhase::Discovery
            );
        }
    }

    mod attributes {
        use super::*;

        #[test]
        fn only_early_phases_require_specific_question() {
            assert!(ConversationPhase::Initial.requires_specific_question());
            assert!(ConversationPhase::Discovery.requires_specific_question());
            assert!(!ConversationPhase::Assessment.requires_specific_question());
            assert!(!ConversationPhase::Guidance.requires_specific_question());
        }

        #[test]
        fn serializes_to_snake_case() {
            let json = serde_json::to_string(&ConversationPhase::Discovery).unwrap();
            assert_eq!(json, "\"discovery\"");
        }

        #[test]
        fn default_is_initial() {
            assert_eq!(ConversationPhase::default(), ConversationPhase::Initial);
        }
    }

    proptest! {
        #[test]
        fn classification_depends_only_on_user_turns(n in 0usize..40) {
            let phase = ConversationPhase::classify(&history_with_user_turns(n));
            let expected = if n == 0 {
                ConversationPhase::Initial
            } else if n <= 2 {
                ConversationPhase::Discovery
            } else if n <= 5 {
                ConversationPhase::Assessment
            } else {
                ConversationPhase::Guidance
            };
            prop_assert_eq!(phase, expected);
        }
    }
}
