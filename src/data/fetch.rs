//! Shared HTTP plumbing for the source adapters.

use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::error::AppError;

/// One timeout for every outbound request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Some upstreams reject requests without a browser-ish user agent.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Why a single fetch produced nothing.
///
/// These never leave the data layer: adapters log them and hand back an
/// empty series.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Build the blocking client shared by an adapter's requests.
///
/// Construction only fails when the TLS backend cannot initialize, which is
/// a process-level fault rather than a per-fetch one.
pub fn blocking_client() -> Result<Client, AppError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to initialize HTTP client: {e}")))
}
