//! Context analysis over the turn history.
//!
//! Extracts coarse signals (age mentioned?, symptom category?) from the user
//! turns with keyword and pattern heuristics. Pure and synchronous.
//!
//! Every user turn is scanned in order and each match overwrites the stored
//! value, so a later mention of an age or symptom replaces an earlier one.
//! Within a single turn the first matching pattern (or category) wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::message::Message;

/// Age patterns, tried in order; the first one that matches a turn wins.
static AGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\d+)[\s-]*(?:years?|yrs?|months?|mos?)\b",
        r"\bage\s+(?:of\s+(?:the\s+|my\s+)?\w+\s+)?is\s+(\d+)",
        r"\b(?:child|son|daughter|baby|kid|boy|girl|he|she)\s+is\s+(\d{1,2})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("age pattern is a valid regex"))
    .collect()
});

/// Symptom category recognised in user turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Fever,
    Cough,
    SoreThroat,
    EarPain,
    Pain,
    Vomiting,
    Diarrhea,
}

impl Symptom {
    /// Categories in match order. More specific categories come before `Pain`
    /// so that "ear pain" is not swallowed by the generic bucket.
    pub const ALL: [Symptom; 7] = [
        Symptom::Fever,
        Symptom::Cough,
        Symptom::SoreThroat,
        Symptom::EarPain,
        Symptom::Pain,
        Symptom::Vomiting,
        Symptom::Diarrhea,
    ];

    /// Human-readable category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fever => "fever",
            Self::Cough => "cough",
            Self::SoreThroat => "sore throat",
            Self::EarPain => "ear pain",
            Self::Pain => "pain",
            Self::Vomiting => "vomiting",
            Self::Diarrhea => "diarrhea",
        }
    }

    /// Lexical variants that identify the category.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Fever => &["fever", "temperature", "feverish", "febrile"],
            Self::Cough => &["cough", "coughing", "coughs"],
            Self::SoreThroat => &["sore throat", "throat hurts", "throat pain", "strep"],
            Self::EarPain => &["ear pain", "earache", "ear hurts", "ear infection"],
            Self::Pain => &["pain", "hurts", "ache", "aching", "sore"],
            Self::Vomiting => &["vomit", "throwing up", "threw up", "puking"],
            Self::Diarrhea => &["diarrhea", "diarrhoea", "loose stool", "watery stool"],
        }
    }

    /// Finds the first category whose keywords appear in lowercased text.
    fn detect(lowercase: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.keywords().iter().any(|k| lowercase.contains(k)))
    }
}

impl std::fmt::Display for Symptom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral signals extracted from the history for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    pub has_age: bool,
    pub age: Option<String>,
    pub has_symptom: bool,
    pub symptom: Option<Symptom>,
    /// Total number of turns in the history (both roles).
    pub message_count: usize,
}

/// Stateless analyzer producing [`ContextInfo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    /// Scans every user turn and records the detected age and symptom.
    pub fn analyze(history: &[Message]) -> ContextInfo {
        let mut info = ContextInfo {
            message_count: history.len(),
            ..ContextInfo::default()
        };

        for message in history.iter().filter(|m| m.is_user()) {
            let content = message.content().to_lowercase();

            if let Some(age) = extract_age(&content) {
                info.has_age = true;
                info.age = Some(age);
            }

            if let Some(symptom) = Symptom::detect(&content) {
                info.has_symptom = true;
                info.symptom = Some(symptom);
            }
        }

        info
    }
}

fn extract_age(lowercase: &str) -> Option<String> {
    AGE_PATTERNS
        .iter()
        .find_map(|re| re.captures(lowercase))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
