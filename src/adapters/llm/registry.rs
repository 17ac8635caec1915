//! Adapter registry - maps provider names to adapter constructors.
//!
//! The table is populated explicitly at startup ([`AdapterRegistry::with_defaults`])
//! and stays open for extension: new providers can be registered at runtime
//! without touching existing entries.
//!
//! # Example
//!
//! ```ignore
//! let registry = AdapterRegistry::with_defaults();
//! let adapter = registry.create("gemini", &config.llm)?;
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::info;

use super::anthropic::{AnthropicBackend, ANTHROPIC_DEFAULT_MODEL};
use super::deepseek::{DeepSeekBackend, DEEPSEEK_DEFAULT_MODEL};
use super::gemini::{GeminiBackend, GEMINI_DEFAULT_MODEL};
use super::local::{LocalBackend, LOCAL_DEFAULT_MODEL};
use super::openai::{OpenAiBackend, OpenAiConfig, OPENAI_DEFAULT_MODEL};
use super::pipeline::GenerationPipeline;
use crate::config::{Credential, LlmConfig, ValidationError};
use crate::ports::LlmAdapter;

/// Builds an adapter from settings.
///
/// Any `Fn(&LlmConfig) -> Result<Arc<dyn LlmAdapter>, ValidationError>` is a
/// constructor with no credential requirement.
pub trait AdapterConstructor: Send + Sync {
    /// Credential that must be present before `construct` is called.
    fn required_credential(&self) -> Option<Credential> {
        None
    }

    /// Model used when settings do not override it.
    fn default_model(&self) -> Option<&'static str> {
        None
    }

    fn construct(&self, settings: &LlmConfig) -> Result<Arc<dyn LlmAdapter>, ValidationError>;
}

impl<F> AdapterConstructor for F
where
    F: Fn(&LlmConfig) -> Result<Arc<dyn LlmAdapter>, ValidationError> + Send + Sync,
{
    fn construct(&self, settings: &LlmConfig) -> Result<Arc<dyn LlmAdapter>, ValidationError> {
        self(settings)
    }
}

/// Constructor for the providers compiled into the crate.
struct Builtin {
    credential: Option<Credential>,
    default_model: &'static str,
    build: fn(&LlmConfig) -> Result<Arc<dyn LlmAdapter>, ValidationError>,
}

impl AdapterConstructor for Builtin {
    fn required_credential(&self) -> Option<Credential> {
        self.credential
    }

    fn default_model(&self) -> Option<&'static str> {
        Some(self.default_model)
    }

    fn construct(&self, settings: &LlmConfig) -> Result<Arc<dyn LlmAdapter>, ValidationError> {
        (self.build)(settings)
    }
}

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown LLM provider '{name}'. Available providers: {}", .available.join(", "))]
    UnknownProvider { name: String, available: Vec<String> },

    #[error(transparent)]
    Configuration(#[from] ValidationError),
}

/// Status of one registered provider, for listings and health output.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProviderStatus {
    pub name: String,
    /// Credential present (or none needed).
    pub configured: bool,
    /// Selected by `llm.provider`.
    pub active: bool,
    pub model: Option<String>,
    pub temperature: f32,
}

/// Name → constructor table.
#[derive(Default)]
pub struct AdapterRegistry {
    constructors: RwLock<BTreeMap<String, Arc<dyn AdapterConstructor>>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("providers", &self.available())
            .finish()
    }
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in provider registered.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(
            "openai",
            Builtin {
                credential: Some(Credential::OpenAi),
                default_model: OPENAI_DEFAULT_MODEL,
                build: |s| {
                    let backend = OpenAiBackend::new(OpenAiConfig::from_settings(s)?)?;
                    Ok(Arc::new(GenerationPipeline::new(backend)))
                },
            },
        );
        registry.register(
            "gemini",
            Builtin {
                credential: Some(Credential::Gemini),
                default_model: GEMINI_DEFAULT_MODEL,
                build: |s| Ok(Arc::new(GenerationPipeline::new(GeminiBackend::from_settings(s)?))),
            },
        );
        registry.register(
            "deepseek",
            Builtin {
                credential: Some(Credential::DeepSeek),
                default_model: DEEPSEEK_DEFAULT_MODEL,
                build: |s| {
                    Ok(Arc::new(GenerationPipeline::new(DeepSeekBackend::from_settings(s)?)))
                },
            },
        );
        registry.register(
            "anthropic",
            Builtin {
                credential: Some(Credential::Anthropic),
                default_model: ANTHROPIC_DEFAULT_MODEL,
                build: |s| {
                    Ok(Arc::new(GenerationPipeline::new(AnthropicBackend::from_settings(s)?)))
                },
            },
        );
        registry.register(
            "local",
            Builtin {
                credential: None,
                default_model: LOCAL_DEFAULT_MODEL,
                build: |s| Ok(Arc::new(GenerationPipeline::new(LocalBackend::from_settings(s)?))),
            },
        );
        registry
    }

    /// Registers a constructor, replacing any existing entry for `name`.
    pub fn register(&self, name: impl Into<String>, constructor: impl AdapterConstructor + 'static) {
        let name = name.into().trim().to_lowercase();
        self.constructors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, Arc::new(constructor));
    }

    /// Registered provider names, sorted.
    pub fn available(&self) -> Vec<String> {
        self.constructors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Builds the adapter registered under `name`.
    ///
    /// # Errors
    ///
    /// - `UnknownProvider` if `name` is not registered
    /// - `Configuration` if the provider's credential is missing or construction fails
    pub fn create(
        &self,
        name: &str,
        settings: &LlmConfig,
    ) -> Result<Arc<dyn LlmAdapter>, RegistryError> {
        let normalized = name.trim().to_lowercase();
        let constructor = self
            .lookup(&normalized)
            .ok_or_else(|| RegistryError::UnknownProvider {
                name: name.to_string(),
                available: self.available(),
            })?;

        if let Some(credential) = constructor.required_credential() {
            settings.require_credential(&normalized, credential)?;
        }

        let adapter = constructor.construct(settings)?;
        info!(
            provider = adapter.provider_name(),
            model = adapter.model(),
            "LLM adapter created"
        );
        Ok(adapter)
    }

    /// Builds the adapter selected by `settings.provider`.
    pub fn create_active(&self, settings: &LlmConfig) -> Result<Arc<dyn LlmAdapter>, RegistryError> {
        self.create(&settings.provider_name(), settings)
    }

    /// Reports, per registered provider, whether it could be constructed.
    pub fn describe(&self, settings: &LlmConfig) -> Vec<ProviderStatus> {
        let active = settings.provider_name();
        self.constructors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, constructor)| ProviderStatus {
                name: name.clone(),
                configured: constructor
                    .required_credential()
                    .map_or(true, |c| settings.has_credential(c)),
                active: *name == active,
                model: settings
                    .model
                    .clone()
                    .or_else(|| constructor.default_model().map(str::to_string)),
                temperature: settings.temperature,
            })
            .collect()
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn AdapterConstructor>> {
        self.constructors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }
}
