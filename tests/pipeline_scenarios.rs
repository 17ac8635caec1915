//! End-to-end scenarios for the generation pipeline.
//!
//! These drive `LlmAdapter::generate` through `GenerationPipeline` with a
//! `MockBackend`, so every pipeline step runs for real and only the model call
//! is scripted.

use std::sync::Arc;
use std::time::Duration;

use pediatric_chat::adapters::llm::{
    AdapterRegistry, GenerationPipeline, MockBackend, MockError, RegistryError, FALLBACK_MESSAGE,
};
use pediatric_chat::config::{LlmConfig, ValidationError};
use pediatric_chat::domain::conversation::{
    symptom_questions, ContextAnalyzer, ConversationPhase, Message, Symptom, AGE_QUESTION,
    EMERGENCY_DISCLAIMER, EMERGENCY_RULES,
};
use pediatric_chat::ports::LlmAdapter;

fn pipeline(backend: &MockBackend) -> GenerationPipeline<MockBackend> {
    GenerationPipeline::new(backend.clone())
}

fn question_marks(text: &str) -> usize {
    text.matches('?').count()
}

// =============================================================================
// Safety interception
// =============================================================================

mod safety {
    use super::*;

    #[tokio::test]
    async fn every_emergency_phrase_short_circuits_the_backend() {
        let backend = MockBackend::new();
        let adapter = pipeline(&backend);

        for (phrase, advisory) in EMERGENCY_RULES {
            let history = vec![
                Message::user("my daughter is 2 years old"),
                Message::assistant("What is the main symptom that worries you?"),
                Message::user(format!("Since this morning: {}!", phrase.to_uppercase())),
            ];
            let reply = adapter.generate(&history).await;

            assert!(reply.is_assistant());
            assert!(reply.content().starts_with(advisory), "{}", phrase);
            assert!(reply.content().ends_with(EMERGENCY_DISCLAIMER));
        }

        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn emergency_phrase_in_an_earlier_turn_does_not_intercept() {
        let backend = MockBackend::new().with_response("How intense is it?");
        let adapter = pipeline(&backend);

        let history = vec![
            Message::user("yesterday he had trouble breathing"),
            Message::assistant("How is he now?"),
            Message::user("he is fine now, just tired"),
        ];
        adapter.generate(&history).await;

        assert_eq!(backend.call_count(), 1);
    }
}

// =============================================================================
// Initial phase
// =============================================================================

mod initial_phase {
    use super::*;

    #[tokio::test]
    async fn empty_conversation_asks_for_age() {
        let backend = MockBackend::new().with_response("Hello! What brings you here today?");
        let reply = pipeline(&backend).generate(&[]).await;

        assert!(reply.content().contains(AGE_QUESTION));
        assert_eq!(question_marks(reply.content()), 1);

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system_prompt.contains("CURRENT PHASE: INITIAL"));
        assert!(calls[0].history.is_empty());
    }

    #[tokio::test]
    async fn any_raw_text_yields_one_age_question() {
        let raws = [
            "",
            "   ",
            "How are you? Is the child sick? Since when?",
            "Please describe the problem.",
            "What age is your child? And what symptoms? And since when?",
        ];

        for raw in raws {
            let backend = MockBackend::new().with_response(raw);
            let reply = pipeline(&backend).generate(&[]).await;
            let content = reply.content();

            assert!(content.to_lowercase().contains("age"), "{:?} -> {:?}", raw, content);
            assert_eq!(question_marks(content), 1, "{:?} -> {:?}", raw, content);
        }
    }
}

// =============================================================================
// Discovery phase
// =============================================================================

mod discovery_phase {
    use super::*;

    #[tokio::test]
    async fn cough_history_requires_first_cough_question() {
        let history = vec![
            Message::user("my son is 3"),
            Message::assistant("..."),
            Message::user("he has a cough"),
        ];
        let info = ContextAnalyzer::analyze(&history);
        assert_eq!(ConversationPhase::classify(&history), ConversationPhase::Discovery);
        assert!(info.has_age);
        assert_eq!(info.symptom, Some(Symptom::Cough));

        let required = symptom_questions(Symptom::Cough)[0];
        let backend = MockBackend::new()
            .with_response("Poor thing. Does he have a fever? Is he drinking enough?");
        let reply = pipeline(&backend).generate(&history).await;

        assert!(reply.content().contains(required));
        assert_eq!(question_marks(reply.content()), 1);

        let prompt = &backend.calls()[0].system_prompt;
        assert!(prompt.contains(required));
        assert!(prompt.contains("CURRENT PHASE: DISCOVERY"));
    }

    #[tokio::test]
    async fn backend_receives_history_unchanged() {
        let history = vec![
            Message::user("my son is 3"),
            Message::assistant("What is the main symptom that worries you?"),
            Message::user("he has a cough"),
        ];
        let backend = MockBackend::new();
        pipeline(&backend).generate(&history).await;

        assert_eq!(backend.calls()[0].history, history);
    }
}

// =============================================================================
// Later phases
// =============================================================================

mod later_phases {
    use super::*;

    fn history_with_user_turns(n: usize) -> Vec<Message> {
        (0..n)
            .flat_map(|i| {
                [
                    Message::user(format!("detail number {}", i)),
                    Message::assistant("Noted. Anything else?"),
                ]
            })
            .collect()
    }

    #[tokio::test]
    async fn multi_question_reply_is_trimmed_in_assessment() {
        let backend = MockBackend::new()
            .with_response("I see.\nHow long has it lasted?\nIs it worse at night?\nDoes he eat?");
        let reply = pipeline(&backend).generate(&history_with_user_turns(4)).await;

        assert_eq!(reply.content(), "I see.\nHow long has it lasted?");
    }

    #[tokio::test]
    async fn question_free_guidance_gets_a_closing_question() {
        let backend = MockBackend::new().with_response("Keep him hydrated and watch the fever.");
        let reply = pipeline(&backend).generate(&history_with_user_turns(7)).await;

        assert!(reply.content().starts_with("Keep him hydrated"));
        assert_eq!(question_marks(reply.content()), 1);
    }
}

// =============================================================================
// Failure handling
// =============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn every_backend_error_becomes_the_fallback() {
        let errors = [
            MockError::Timeout { timeout_secs: 30 },
            MockError::Http { status: 429 },
            MockError::Network {
                message: "connection reset".to_string(),
            },
            MockError::Parse {
                message: "unexpected token".to_string(),
            },
        ];

        for error in errors {
            let backend = MockBackend::new().with_error(error.clone());
            let reply = pipeline(&backend).generate(&[Message::user("my son is 3")]).await;

            assert!(reply.is_assistant());
            assert_eq!(reply.content(), FALLBACK_MESSAGE, "{:?}", error);
        }
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_adapter() {
        let backend = MockBackend::new().with_delay(Duration::from_millis(20));
        let adapter: Arc<dyn LlmAdapter> = Arc::new(pipeline(&backend));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let adapter = Arc::clone(&adapter);
                tokio::spawn(async move {
                    adapter
                        .generate(&[Message::user(format!("my child is {} years old", i + 1))])
                        .await
                })
            })
            .collect();

        for handle in handles {
            let reply = handle.await.unwrap();
            assert_eq!(question_marks(reply.content()), 1);
        }
        assert_eq!(backend.call_count(), 8);
    }
}

// =============================================================================
// Registry
// =============================================================================

mod registry {
    use super::*;

    #[test]
    fn unknown_provider_lists_registered_names() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry
            .create("mistral", &LlmConfig::default())
            .err()
            .unwrap();

        match &err {
            RegistryError::UnknownProvider { name, available } => {
                assert_eq!(name, "mistral");
                assert!(available.contains(&"openai".to_string()));
                assert!(available.contains(&"local".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn registering_a_provider_keeps_existing_ones() {
        let registry = AdapterRegistry::with_defaults();
        let before = registry.available();

        registry.register("scripted", |_: &LlmConfig| {
            let adapter: Arc<dyn LlmAdapter> =
                Arc::new(GenerationPipeline::new(MockBackend::new()));
            Ok::<_, ValidationError>(adapter)
        });

        let adapter = registry.create("scripted", &LlmConfig::default()).unwrap();
        assert_eq!(adapter.provider_name(), "mock");

        let after = registry.available();
        assert_eq!(after.len(), before.len() + 1);
        for name in before {
            assert!(registry.is_registered(&name));
        }
    }

    #[test]
    fn missing_credential_names_the_env_var() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry
            .create("anthropic", &LlmConfig::default())
            .err()
            .unwrap();

        assert!(matches!(err, RegistryError::Configuration(_)));
        assert!(err.to_string().contains("PEDIATRIC_CHAT__LLM__ANTHROPIC_API_KEY"));
    }
}
