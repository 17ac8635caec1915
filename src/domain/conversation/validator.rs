//! Response validation and correction.
//!
//! Post-processes raw backend text so that every reply:
//!
//! 1. is non-empty (empty text becomes a phase-appropriate canned opener),
//! 2. carries the resolved required question in the `Initial` and
//!    `Discovery` phases,
//! 3. contains exactly one question mark.
//!
//! This is a best-effort policy layer operating on natural-language output.
//! It guarantees the structural properties above, not semantic correctness.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use tracing::{debug, warn};

use super::context::ContextInfo;
use super::phase::ConversationPhase;
use super::prompts::{
    required_question, AGE_QUESTION, CLOSING_QUESTION, EMPATHY_OPENER, INTENSITY_QUESTION,
    MORE_DETAIL_QUESTION, OPENER,
};

static AGE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bage\b").expect("age reference is a valid regex"));

/// Stateless corrector applied to every backend reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    /// Corrects raw backend text for the given phase and context.
    pub fn correct(raw: &str, phase: ConversationPhase, info: &ContextInfo) -> String {
        let text = raw.trim();
        if text.is_empty() {
            debug!(phase = phase.label(), "empty backend reply replaced with canned opener");
            return canned_reply(phase, info);
        }

        if phase.requires_specific_question() {
            let required = required_question(phase, info);
            let forced = force_required_question(text, phase, required);
            enforce_single_question(&forced, phase, Some(required))
        } else {
            enforce_single_question(text, phase, None)
        }
    }
}

/// Reply used when the backend returned nothing usable.
pub fn canned_reply(phase: ConversationPhase, info: &ContextInfo) -> String {
    match phase {
        ConversationPhase::Initial => format!("{} {}", OPENER, AGE_QUESTION),
        _ => format!("{} {}", EMPATHY_OPENER, required_question(phase, info)),
    }
}

/// Question appended when a reply has no question at all.
pub fn fallback_question(phase: ConversationPhase) -> &'static str {
    match phase {
        ConversationPhase::Initial => AGE_QUESTION,
        ConversationPhase::Discovery => MORE_DETAIL_QUESTION,
        ConversationPhase::Assessment => INTENSITY_QUESTION,
        ConversationPhase::Guidance => CLOSING_QUESTION,
    }
}

/// Makes sure the required question is present, rewriting when it is not.
fn force_required_question(text: &str, phase: ConversationPhase, required: &str) -> String {
    let lowercase = text.to_lowercase();

    if phase == ConversationPhase::Initial
        && (!AGE_REFERENCE.is_match(&lowercase) || !text.contains('?'))
    {
        debug!("initial reply lacks an age question; rebuilding");
        return format!("{} {}", OPENER, required);
    }

    if lowercase.contains(&required.to_lowercase()) {
        return text.to_string();
    }

    if phase == ConversationPhase::Initial {
        return format!("{} {}", OPENER, required);
    }

    debug!(required, "splicing required question into reply");
    let mut lines: Vec<&str> = text.split('\n').filter(|l| !l.contains('?')).collect();
    lines.push(required);
    lines.join("\n")
}

/// Reduces the reply to exactly one question mark.
fn enforce_single_question(
    text: &str,
    phase: ConversationPhase,
    preferred: Option<&str>,
) -> String {
    match text.matches('?').count() {
        0 => format!("{}\n\n{}", text, fallback_question(phase)),
        1 => text.to_string(),
        n => {
            warn!(
                phase = phase.label(),
                questions = n,
                "multiple questions detected in reply; trimming"
            );
            keep_one_question(text, phase, preferred)
        }
    }
}

fn keep_one_question(text: &str, phase: ConversationPhase, preferred: Option<&str>) -> String {
    let stem = preferred.map(|q| question_stem(q).to_lowercase());
    let lines: Vec<&str> = text.split('\n').collect();

    let keep = preferred
        .and_then(|q| lines.iter().position(|l| find_ignore_case(l, q).is_some()))
        .or_else(|| {
            stem.as_deref()
                .and_then(|s| lines.iter().position(|l| l.to_lowercase().contains(s)))
        })
        .or_else(|| lines.iter().position(|l| l.contains('?')));

    let mut kept: Vec<String> = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        if !line.contains('?') {
            kept.push((*line).to_string());
        } else if Some(idx) == keep {
            kept.push(single_question_line(line, preferred, stem.as_deref()));
        }
    }

    if keep.is_none() {
        kept.push(fallback_question(phase).to_string());
    }

    kept.join("\n")
}

/// Cuts a line holding several questions down to one.
///
/// When the line carries the whole preferred question it is kept verbatim,
/// including any text after its question mark, and every other question on
/// the line is dropped. Otherwise the line is split after each question mark
/// and the segment matching the stem (or else the first question) survives
/// along with any text that has no question mark.
fn single_question_line(line: &str, preferred: Option<&str>, stem: Option<&str>) -> String {
    if line.matches('?').count() <= 1 {
        return line.to_string();
    }

    if let Some(range) = preferred.and_then(|q| find_ignore_case(line, q)) {
        let out = format!(
            "{}{}{}",
            strip_questions(&line[..range.start]),
            &line[range.clone()],
            strip_questions(&line[range.end..]),
        );
        return out.trim().to_string();
    }

    let segments: Vec<&str> = line.split_inclusive('?').collect();
    let chosen = stem
        .and_then(|s| {
            segments
                .iter()
                .position(|seg| seg.ends_with('?') && seg.to_lowercase().contains(s))
        })
        .or_else(|| segments.iter().position(|seg| seg.ends_with('?')));

    let mut out = String::with_capacity(line.len());
    for (idx, segment) in segments.iter().enumerate() {
        if !segment.ends_with('?') || Some(idx) == chosen {
            out.push_str(segment);
        }
    }
    out.trim().to_string()
}

/// Drops every question-terminated segment, keeping the plain text.
fn strip_questions(text: &str) -> String {
    text.split_inclusive('?')
        .filter(|seg| !seg.ends_with('?'))
        .collect()
}

/// Byte range of `needle` in `haystack`, ignoring case.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<Range<usize>> {
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()?
        .find(haystack)
        .map(|m| m.range())
}

/// The part of a question up to and including its question mark.
fn question_stem(question: &str) -> &str {
    match question.find('?') {
        Some(idx) => &question[..=idx],
        None => question,
    }
}
