//! Local inference backend.
//!
//! Formats the history as a plain-text transcript and runs generation on a
//! dedicated worker thread, so CPU-bound inference never runs on the async
//! runtime. The worker owns the model and serves one job at a time through a
//! single-slot queue: concurrent callers wait their turn without blocking
//! requests routed to other providers.
//!
//! ```text
//! invoke ─► jobs (capacity 1) ─► worker thread ─► LocalModel::generate
//!    ▲                                                  │
//!    └──────────────── oneshot reply ◄──────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::config::{LlmConfig, ValidationError};
use crate::domain::conversation::{Message, Role};
use crate::ports::{BackendError, ProviderBackend};

pub const LOCAL_DEFAULT_MODEL: &str = "llama3.1";

/// Sampling parameters for local generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 300,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// A model that completes a plain-text prompt.
///
/// Implementations run on the worker thread only and may block.
pub trait LocalModel: Send + 'static {
    fn generate(&mut self, prompt: &str, params: &GenerationParams)
        -> Result<String, BackendError>;
}

struct Job {
    prompt: String,
    reply: oneshot::Sender<Result<String, BackendError>>,
}

/// Local inference backend.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    model: String,
    jobs: mpsc::Sender<Job>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("prompt_len", &self.prompt.len()).finish()
    }
}

impl LocalBackend {
    /// Creates the backend with the default Ollama-served model.
    ///
    /// # Errors
    ///
    /// - `InvalidEndpoint` if the endpoint is not an http(s) URL
    /// - `HttpClient` if the worker's HTTP client cannot be built
    pub fn from_settings(settings: &LlmConfig) -> Result<Self, ValidationError> {
        let endpoint = settings.local_endpoint.trim_end_matches('/').to_string();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidEndpoint(endpoint));
        }

        let model = settings.model_or(LOCAL_DEFAULT_MODEL);
        let timeout = settings.timeout();
        let params = GenerationParams {
            temperature: settings.temperature,
            ..GenerationParams::default()
        };
        let model_name = model.clone();
        Self::spawn(model, params, move || {
            OllamaModel::new(endpoint, model_name, timeout)
        })
    }

    /// Starts the worker thread and builds the model on it.
    ///
    /// Blocks until the model is initialized so that construction failures
    /// surface here rather than on the first call.
    pub fn spawn<M, F>(
        model: impl Into<String>,
        params: GenerationParams,
        init: F,
    ) -> Result<Self, ValidationError>
    where
        M: LocalModel,
        F: FnOnce() -> Result<M, ValidationError> + Send + 'static,
    {
        let model = model.into();
        let (jobs_tx, mut jobs_rx) = mpsc::channel::<Job>(1);
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), ValidationError>>();

        let worker_name = format!("local-inference-{}", model);
        thread::Builder::new()
            .name(worker_name)
            .spawn(move || {
                let mut local_model = match init() {
                    Ok(m) => {
                        let _ = ready_tx.send(Ok(()));
                        m
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while let Some(job) = jobs_rx.blocking_recv() {
                    debug!(prompt_len = job.prompt.len(), "local generation started");
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        local_model.generate(&job.prompt, &params)
                    }))
                    .unwrap_or_else(|payload| {
                        let reason = panic_reason(payload.as_ref());
                        error!(reason = %reason, "local model panicked; worker kept alive");
                        Err(BackendError::inference(format!("local model panicked: {}", reason)))
                    });
                    if job.reply.send(result).is_err() {
                        debug!("local generation caller went away");
                    }
                }
                debug!("local inference worker stopped");
            })
            .map_err(|e| ValidationError::HttpClient(format!("worker thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| ValidationError::HttpClient("local worker exited during startup".into()))??;

        info!(provider = "local", model = %model, "backend initialized");
        Ok(Self {
            model,
            jobs: jobs_tx,
        })
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Renders the plain-text transcript with a trailing open assistant turn.
pub fn transcript(history: &[Message], system_prompt: &str) -> String {
    let mut prompt = String::with_capacity(system_prompt.len() + 64 * (history.len() + 1));
    prompt.push_str(system_prompt.trim());
    prompt.push_str("\n\n");
    for message in history {
        let label = match message.role() {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        let _ = writeln!(prompt, "{}: {}", label, message.content());
    }
    prompt.push_str("Assistant: ");
    prompt
}

#[async_trait]
impl ProviderBackend for LocalBackend {
    type Request = String;

    fn name(&self) -> &'static str {
        "local"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn format(&self, history: &[Message], system_prompt: &str) -> String {
        transcript(history, system_prompt)
    }

    async fn invoke(&self, prompt: String) -> Result<String, BackendError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.jobs
            .send(Job {
                prompt,
                reply: reply_tx,
            })
            .await
            .map_err(|_| BackendError::WorkerUnavailable)?;

        reply_rx.await.map_err(|_| BackendError::WorkerUnavailable)?
    }
}

// ----- Ollama -----

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    stop: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Default local model: a local Ollama daemon in raw-prompt mode.
pub struct OllamaModel {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    timeout_secs: u64,
}

impl OllamaModel {
    /// Builds the blocking client. Call on the worker thread.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ValidationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidationError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            timeout_secs: timeout.as_secs(),
        })
    }
}

impl LocalModel for OllamaModel {
    fn generate(
        &mut self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            raw: true,
            stream: false,
            options: OllamaOptions {
                num_predict: params.max_new_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
                stop: vec!["\nUser:"],
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    BackendError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!(status = status.as_u16(), "local model daemon returned an error");
            return Err(BackendError::http(status.as_u16(), body));
        }

        let body: OllamaResponse = response
            .json()
            .map_err(|e| BackendError::parse(format!("Failed to parse response: {}", e)))?;
        Ok(body.response.trim().to_string())
    }
}
