//! Integration tests for a full consultation through `ConversationService`.
//!
//! Wires the in-memory repository and a mock-backed pipeline exactly as the
//! binary wires the real ones.

use std::sync::Arc;

use pediatric_chat::adapters::llm::{GenerationPipeline, MockBackend};
use pediatric_chat::adapters::storage::InMemoryConversationRepository;
use pediatric_chat::application::ConversationService;
use pediatric_chat::domain::conversation::{
    symptom_questions, Role, Symptom, AGE_QUESTION, MAIN_SYMPTOM_QUESTION,
};
use pediatric_chat::domain::foundation::ErrorCode;

fn wire(backend: &MockBackend) -> (ConversationService, Arc<InMemoryConversationRepository>) {
    let repository = Arc::new(InMemoryConversationRepository::new());
    let service = ConversationService::new(
        repository.clone(),
        Arc::new(GenerationPipeline::new(backend.clone())),
    );
    (service, repository)
}

#[tokio::test]
async fn consultation_walks_through_the_phases() {
    let cough_question = symptom_questions(Symptom::Cough)[0];
    let backend = MockBackend::new()
        .with_response(format!("Thanks. {}", MAIN_SYMPTOM_QUESTION))
        .with_response(format!("I see. {}", cough_question))
        .with_response("Got it. How long has it lasted? Any fever?")
        .with_response("Does it get worse at night?");
    let (service, repository) = wire(&backend);
    let conversation = service.create_conversation().await.unwrap();
    let id = *conversation.id();

    let first = service.handle_message(&id, "my son is 3 years old").await.unwrap();
    assert!(first.content().contains(MAIN_SYMPTOM_QUESTION));

    let second = service.handle_message(&id, "he has a bad cough").await.unwrap();
    assert!(second.content().contains(cough_question));

    let third = service.handle_message(&id, "it is dry").await.unwrap();
    assert_eq!(third.content().matches('?').count(), 1);
    assert!(third.content().contains("How long has it lasted?"));

    service.handle_message(&id, "since monday").await.unwrap();

    let prompts: Vec<String> = backend.calls().into_iter().map(|c| c.system_prompt).collect();
    assert!(prompts[0].contains("CURRENT PHASE: DISCOVERY"));
    assert!(prompts[1].contains("CURRENT PHASE: DISCOVERY"));
    assert!(prompts[2].contains("CURRENT PHASE: ASSESSMENT"));
    assert!(prompts[3].contains("CURRENT PHASE: ASSESSMENT"));
    assert!(!prompts[2].contains("QUESTION CONTROL"));

    let history = service.get_history(&id).await.unwrap();
    assert_eq!(history.len(), 8);
    let roles: Vec<Role> = history.iter().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        [
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant
        ]
    );
    assert_eq!(repository.count().await, 1);
}

#[tokio::test]
async fn emergency_turn_is_stored_and_backend_skipped() {
    let backend = MockBackend::new();
    let (service, _) = wire(&backend);
    let conversation = service.create_conversation().await.unwrap();

    let reply = service
        .handle_message(conversation.id(), "She is not responding and very drowsy")
        .await
        .unwrap();

    assert!(reply.content().starts_with("URGENT"));
    assert_eq!(backend.call_count(), 0);
    assert_eq!(service.get_history(conversation.id()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn rejected_turn_leaves_history_untouched() {
    let backend = MockBackend::new();
    let (service, _) = wire(&backend);
    let conversation = service.create_conversation().await.unwrap();

    let err = service
        .handle_message(conversation.id(), "")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationFailed);
    assert!(service.get_history(conversation.id()).await.unwrap().is_empty());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn conversations_are_isolated() {
    let backend = MockBackend::new();
    let (service, _) = wire(&backend);
    let a = service.create_conversation().await.unwrap();
    let b = service.create_conversation().await.unwrap();

    service.handle_message(a.id(), "my daughter is 5 years old").await.unwrap();

    assert_eq!(service.get_history(a.id()).await.unwrap().len(), 2);
    assert!(service.get_history(b.id()).await.unwrap().is_empty());

    // The second conversation starts fresh, so its first call is still discovery
    // with no age known.
    service.handle_message(b.id(), "hello").await.unwrap();
    let prompt = &backend.calls()[1].system_prompt;
    assert!(prompt.contains("- Child's age: unknown"));
    assert!(prompt.contains(AGE_QUESTION));
}
