//! Shared HTTP plumbing for the network backends.
//!
//! Keeps timeout, status and decode failures distinct so the pipeline can log
//! them separately before collapsing them into the fallback reply.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ValidationError;
use crate::ports::BackendError;

/// Longest error body kept in a `BackendError::Http`.
const MAX_ERROR_BODY: usize = 512;

/// Builds a client with the bounded request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, ValidationError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ValidationError::HttpClient(e.to_string()))
}

/// Maps a transport error, keeping timeouts distinct.
pub(crate) fn map_send_error(err: reqwest::Error, timeout_secs: u64) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout { timeout_secs }
    } else if err.is_connect() {
        BackendError::network(format!("Connection failed: {}", err))
    } else {
        BackendError::network(err.to_string())
    }
}

/// Checks the status and decodes a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    timeout_secs: u64,
) -> Result<T, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| map_send_error(e, timeout_secs))?;

    if !status.is_success() {
        return Err(BackendError::http(status.as_u16(), truncate(&body)));
    }

    serde_json::from_str(&body)
        .map_err(|e| BackendError::parse(format!("Failed to parse response: {}", e)))
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
