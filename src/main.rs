//! Pediatric chat console.
//!
//! Starts one conversation and relays stdin lines through the configured
//! provider, printing each reply.
//!
//! ## Usage
//!
//! ```bash
//! # Default provider (OpenAI)
//! PEDIATRIC_CHAT__LLM__OPENAI_API_KEY=sk-... pediatric-chat
//!
//! # Local Ollama model with JSON logs
//! PEDIATRIC_CHAT__LLM__PROVIDER=local PEDIATRIC_CHAT__LOGGING__FORMAT=json pediatric-chat
//!
//! # Redis-backed conversation store
//! PEDIATRIC_CHAT__STORAGE__BACKEND=redis pediatric-chat
//! ```

use std::error::Error;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pediatric_chat::adapters::llm::AdapterRegistry;
use pediatric_chat::adapters::storage::{
    InMemoryConversationRepository, RedisConversationRepository,
};
use pediatric_chat::application::ConversationService;
use pediatric_chat::config::{AppConfig, LogFormat, LoggingConfig, StorageBackend};
use pediatric_chat::ports::ConversationRepository;

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn build_repository(
    config: &AppConfig,
) -> Result<Arc<dyn ConversationRepository>, Box<dyn Error>> {
    let repository: Arc<dyn ConversationRepository> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryConversationRepository::new()),
        StorageBackend::Redis => {
            Arc::new(RedisConversationRepository::connect(&config.redis).await?)
        }
    };
    info!(backend = ?config.storage.backend, "conversation store ready");
    Ok(repository)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load()?;
    init_logging(&config.logging);
    config.validate()?;

    let registry = AdapterRegistry::with_defaults();
    for status in registry.describe(&config.llm) {
        if status.active && !status.configured {
            warn!(provider = %status.name, "active provider has no credential");
        }
        info!(
            provider = %status.name,
            configured = status.configured,
            active = status.active,
            model = status.model.as_deref().unwrap_or("-"),
            "provider registered"
        );
    }

    let adapter = registry.create_active(&config.llm)?;
    let repository = build_repository(&config).await?;
    let service = ConversationService::new(repository, adapter);

    let conversation = service.create_conversation().await?;
    info!(
        conversation_id = %conversation.id(),
        provider = service.adapter().provider_name(),
        model = service.adapter().model(),
        "chat started"
    );

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Pediatric assistant ready. Describe your child's situation (Ctrl-D to quit).\n> ")
        .await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            let reply = service.handle_message(conversation.id(), &line).await?;
            stdout.write_all(format!("\n{}\n\n", reply.content()).as_bytes()).await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    info!(conversation_id = %conversation.id(), "chat ended");
    Ok(())
}
