//! Emergency keyword interception.
//!
//! Inspects the most recent user turn for emergency phrases before any
//! backend is contacted. A match short-circuits generation with a fixed
//! urgent-care advisory.

use super::message::Message;

const SEEK_CARE_NOW: &str = "URGENT: Seek immediate medical attention.";
const INFANT_HIGH_FEVER: &str =
    "URGENT: If this is a baby under 3 months old, see a doctor immediately.";

/// Emergency phrases and their advisories.
///
/// Order is significant: the first phrase found in the turn wins.
pub const EMERGENCY_RULES: &[(&str, &str)] = &[
    ("difficulty breathing", SEEK_CARE_NOW),
    ("trouble breathing", SEEK_CARE_NOW),
    ("unresponsive", SEEK_CARE_NOW),
    ("not responding", SEEK_CARE_NOW),
    ("very drowsy", SEEK_CARE_NOW),
    ("seizure", SEEK_CARE_NOW),
    ("convulsion", SEEK_CARE_NOW),
    ("severe dehydration", SEEK_CARE_NOW),
    ("fever of 40", INFANT_HIGH_FEVER),
    ("fever 40", INFANT_HIGH_FEVER),
    ("40°c", INFANT_HIGH_FEVER),
    ("bleeding", SEEK_CARE_NOW),
    ("unconscious", SEEK_CARE_NOW),
    ("respiratory arrest", SEEK_CARE_NOW),
    ("stopped breathing", SEEK_CARE_NOW),
];

/// Disclaimer appended to every advisory.
pub const EMERGENCY_DISCLAIMER: &str =
    "Please seek medical care right away. This information does not replace a professional medical consultation.";

/// Stateless emergency check run ahead of every generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyInterceptor;

impl SafetyInterceptor {
    /// Returns the advisory for the first emergency phrase found in `text`.
    pub fn advisory_for(text: &str) -> Option<&'static str> {
        let lowercase = text.to_lowercase();
        EMERGENCY_RULES
            .iter()
            .find(|(phrase, _)| lowercase.contains(phrase))
            .map(|(_, advisory)| *advisory)
    }

    /// Checks the latest turn; only a user turn can trigger interception.
    ///
    /// Returns the terminal assistant message, or `None` to proceed.
    pub fn check(history: &[Message]) -> Option<Message> {
        let last = history.last().filter(|m| m.is_user())?;
        let advisory = Self::advisory_for(last.content())?;
        Some(Message::assistant(format!(
            "{}\n\n{}",
            advisory, EMERGENCY_DISCLAIMER
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_is_not_intercepted() {
        assert!(SafetyInterceptor::check(&[]).is_none());
    }

    #[test]
    fn benign_turn_is_not_intercepted() {
        let history = vec![Message::user("he has a mild cough")];
        assert!(SafetyInterceptor::check(&history).is_none());
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let history = vec![Message::user("She had a SEIZURE this morning")];
        let reply = SafetyInterceptor::check(&history).unwrap();
        assert!(reply.is_assistant());
        assert!(reply.content().starts_with(SEEK_CARE_NOW));
        assert!(reply.content().contains(EMERGENCY_DISCLAIMER));
    }

    #[test]
    fn only_latest_turn_is_inspected() {
        let history = vec![
            Message::user("he was unconscious for a second"),
            Message::assistant("..."),
            Message::user("now he is fine"),
        ];
        assert!(SafetyInterceptor::check(&history).is_none());
    }

    #[test]
    fn latest_assistant_turn_is_never_intercepted() {
        let history = vec![Message::assistant("watch for difficulty breathing")];
        assert!(SafetyInterceptor::check(&history).is_none());
    }

    #[test]
    fn first_rule_in_table_order_wins() {
        // "fever 40" precedes "bleeding" in the table.
        assert_eq!(
            SafetyInterceptor::advisory_for("fever 40 and a bleeding nose"),
            Some(INFANT_HIGH_FEVER)
        );
        // "difficulty breathing" precedes "fever 40".
        assert_eq!(
            SafetyInterceptor::advisory_for("fever 40 and difficulty breathing"),
            Some(SEEK_CARE_NOW)
        );
    }

    #[test]
    fn every_rule_triggers() {
        assert!(EMERGENCY_RULES.len() >= 9);
        for (phrase, advisory) in EMERGENCY_RULES {
            let text = format!("my kid: {}", phrase.to_uppercase());
            assert!(
                SafetyInterceptor::advisory_for(&text).is_some(),
                "{} should trigger",
                phrase
            );
            assert!(!advisory.is_empty());
        }
    }
}
