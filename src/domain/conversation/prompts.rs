//! System prompt composition.
//!
//! Builds the full system instruction for the current phase. The text is
//! backend-agnostic: every provider adapter receives the same prompt and only
//! differs in how it packages it.
//!
//! For the `Initial` and `Discovery` phases the prompt embeds one concrete
//! next question, resolved by [`required_question`], which the backend must
//! reproduce verbatim. The response validator enforces the same question.

use std::fmt::Write as _;

use super::context::{ContextInfo, Symptom};
use super::message::Message;
use super::phase::ConversationPhase;

pub const AGE_QUESTION: &str = "What is the child's age?";
pub const MAIN_SYMPTOM_QUESTION: &str = "What is the main symptom that worries you?";
pub const ONSET_QUESTION: &str = "When did this start?";
pub const INTENSITY_QUESTION: &str = "How intense is the symptom? (mild, moderate, severe)";
pub const CLOSING_QUESTION: &str = "Is there anything else I should know about the situation?";
pub const MORE_DETAIL_QUESTION: &str = "Could you tell me more about the symptoms?";

/// Greeting used when a reply has to be rebuilt from scratch.
pub const OPENER: &str = "Hello, I'm the pediatric assistant.";

/// Opening used for empty replies outside the initial phase.
pub const EMPATHY_OPENER: &str = "I understand your concern.";

const PERSONA: &str = "\
You are an experienced, empathetic pediatric assistant. Your goal is to help \
parents understand their child's health situation through a natural, educational conversation.

CORE GUIDELINES:
1. ACT LIKE A REAL PEDIATRICIAN: ask discovery questions one at a time, as in a real consultation
2. NO DEFINITIVE DIAGNOSES: only provide educational information and general orientation
3. ALWAYS RECOMMEND SEEING A DOCTOR for any worrying symptom
4. USE CLEAR, EMPATHETIC LANGUAGE suited to worried parents
5. ASK ONE QUESTION AT A TIME: never bombard the parent with several questions
6. BUILD ON WHAT YOU ALREADY KNOW about the child

IMPORTANT LIMITS:
- Do NOT prescribe specific medication
- Do NOT give definitive diagnoses
- Do NOT replace a professional medical consultation
- ALWAYS put the child's safety first";

const STRICT_RULES: &str = "\
STRICT RULES:
- ONLY ONE QUESTION per reply during discovery
- SPECIFIC questions, never general ones
- Empathetic and professional language
- Always put the child's safety first
- If you detect emergency symptoms, reply immediately with a safety alert";

/// Follow-up questions for symptom categories that have a dedicated script.
pub fn symptom_questions(symptom: Symptom) -> &'static [&'static str] {
    match symptom {
        Symptom::Fever => &[
            "What is the child's temperature?",
            "How is the child behaving with the fever?",
            "Has the child taken any medication for the fever?",
            "Has the fever gone up or down since it started?",
        ],
        Symptom::Cough => &[
            "What kind of cough is it? (dry, wet, barking)",
            "When does the child cough the most? (night, day, while eating)",
            "Does the cough stop the child from sleeping or eating?",
            "Is there any noise when the child breathes?",
        ],
        Symptom::Pain => &[
            "Where exactly does it hurt?",
            "What kind of pain is it? (sharp, dull, cramping)",
            "Is the pain constant or does it come and go?",
            "Does anything relieve the pain?",
        ],
        Symptom::Vomiting => &[
            "How many times has the child vomited?",
            "What does the vomit look like?",
            "Can the child keep fluids down?",
            "Is there any tummy pain along with it?",
        ],
        Symptom::SoreThroat | Symptom::EarPain | Symptom::Diarrhea => &[],
    }
}

/// Resolves the single mandatory next question for a phase and context.
pub fn required_question(phase: ConversationPhase, info: &ContextInfo) -> &'static str {
    match phase {
        ConversationPhase::Initial => AGE_QUESTION,
        ConversationPhase::Discovery => match (info.has_age, info.symptom) {
            (false, _) => AGE_QUESTION,
            (true, None) => MAIN_SYMPTOM_QUESTION,
            (true, Some(symptom)) => symptom_questions(symptom)
                .first()
                .copied()
                .unwrap_or(ONSET_QUESTION),
        },
        ConversationPhase::Assessment => INTENSITY_QUESTION,
        ConversationPhase::Guidance => CLOSING_QUESTION,
    }
}

/// Builds system instructions from phase and context.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer;

impl PromptComposer {
    /// Composes the full system prompt for one generation call.
    pub fn compose(history: &[Message], phase: ConversationPhase, info: &ContextInfo) -> String {
        let mut prompt = String::with_capacity(2048);
        prompt.push_str(PERSONA);
        prompt.push_str("\n\n");

        let _ = writeln!(prompt, "CURRENT PHASE: {}", phase.label());
        prompt.push('\n');
        prompt.push_str(phase_directive(phase));
        prompt.push('\n');

        prompt.push_str(&known_context(history, info));
        prompt.push('\n');
        prompt.push_str(STRICT_RULES);

        if phase.requires_specific_question() {
            let question = required_question(phase, info);
            prompt.push_str("\n\nQUESTION CONTROL:\n");
            prompt.push_str("- You MUST ask ONLY ONE question in your reply\n");
            prompt.push_str("- Do NOT ask several questions\n");
            prompt.push_str("- Do NOT write lists of questions\n");
            prompt.push_str("- Your reply must end with a single question\n");
            let _ = writeln!(prompt, "- You MUST ask this exact question: '{}'", question);
            let _ = writeln!(
                prompt,
                "- Example of a correct reply: '{} {}'",
                OPENER, question
            );
        }

        prompt
    }
}

fn phase_directive(phase: ConversationPhase) -> &'static str {
    match phase {
        ConversationPhase::Initial => "\
SPECIFIC INSTRUCTIONS:
- This is the first interaction. You MUST ask ONE specific question.
- Ask EXACTLY: 'What is the child's age?'
- Do NOT ask general questions such as 'what brings you here?'
- Do NOT ask about symptoms until you know the age.
",
        ConversationPhase::Discovery => "\
SPECIFIC INSTRUCTIONS:
- You are in the discovery phase. Ask ONE specific question.
- Base your question on the information you already have.
- If you know the age but not the symptom, ask for the main symptom.
- If you know both age and symptom, ask about the specific details of the symptom.
- Do NOT ask general or vague questions.
",
        ConversationPhase::Assessment => "\
SPECIFIC INSTRUCTIONS:
- You already have the basic information. Ask one specific assessment question.
- Ask about intensity, duration, or specific behaviour.
- Keep the focus on ONE question at a time.
",
        ConversationPhase::Guidance => "\
SPECIFIC INSTRUCTIONS:
- You have enough information. Provide educational guidance.
- Explain what might be happening and when to see a doctor.
- Always recommend consulting a doctor if there is any concern.
",
    }
}

fn known_context(history: &[Message], info: &ContextInfo) -> String {
    let user_turns = history.iter().filter(|m| m.is_user()).count();
    format!(
        "KNOWN CONTEXT:\n- Child's age: {}\n- Main symptom: {}\n- Parent messages so far: {}\n",
        info.age.as_deref().unwrap_or("unknown"),
        info.symptom.map(|s| s.as_str()).unwrap_or("unknown"),
        user_turns,
    )
}
