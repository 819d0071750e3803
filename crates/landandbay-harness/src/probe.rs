// crates/landandbay-harness/src/probe.rs
// ============================================================================
// Module: HTTP Readiness Probe
// Description: Polls an HTTP endpoint until it answers as expected.
// Purpose: Wait for a deployed service's health endpoint after apply.
// Dependencies: reqwest, tokio
// ============================================================================

//! ## Overview
//! [`http_get_with_retry`] issues GET requests until the response has the
//! expected status and its body contains the expected substring, or the
//! attempt budget runs out. Connection errors and unexpected responses both
//! consume an attempt.

use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Readiness probe failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(String),
    /// The attempt budget ran out.
    #[error("{url} not ready after {attempts} attempts: {last}")]
    NotReady {
        /// Probed URL.
        url: String,
        /// Attempts made.
        attempts: u32,
        /// Last observed outcome.
        last: String,
    },
}

/// Expected response of a readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeExpectation {
    /// Required status code.
    pub status: u16,
    /// Substring the body must contain; empty accepts any body.
    pub body_contains: String,
}

impl ProbeExpectation {
    /// Expects `200 OK` with any body.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            body_contains: String::new(),
        }
    }

    /// Requires the body to contain `text`.
    #[must_use]
    pub fn with_body(mut self, text: impl Into<String>) -> Self {
        self.body_contains = text.into();
        self
    }
}

/// Polls `url` until it matches `expect`, returning the matching body.
///
/// # Errors
///
/// Returns [`ProbeError::NotReady`] after `max_attempts` failed attempts.
pub async fn http_get_with_retry(
    url: &str,
    expect: &ProbeExpectation,
    max_attempts: u32,
    interval: Duration,
) -> Result<String, ProbeError> {
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|err| ProbeError::Client(err.to_string()))?;
    let attempts = max_attempts.max(1);
    let mut last = String::from("no attempt made");
    for attempt in 1..=attempts {
        match probe_once(&client, url, expect).await {
            Ok(body) => return Ok(body),
            Err(outcome) => last = outcome,
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    Err(ProbeError::NotReady {
        url: url.to_string(),
        attempts,
        last,
    })
}

/// Issues one request and checks the response.
async fn probe_once(
    client: &Client,
    url: &str,
    expect: &ProbeExpectation,
) -> Result<String, String> {
    let response = client.get(url).send().await.map_err(|err| err.to_string())?;
    let status = response.status();
    let body = response.text().await.map_err(|err| err.to_string())?;
    if status.as_u16() != expect.status {
        return Err(format!("http status {status}"));
    }
    if !body.contains(expect.body_contains.as_str()) {
        return Err(format!("body does not contain '{}'", expect.body_contains));
    }
    Ok(body)
}
