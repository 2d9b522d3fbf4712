//! HTTP client utilities.
//!
//! Provides the shared HTTP client and the response helpers every verifier
//! uses to turn a provider reply into a verification outcome.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::error::{KeyprobeError, Result};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Message used when a provider error body carries no usable text.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("keyprobe/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| KeyprobeError::Network(e.to_string()))
}

/// Map a transport error to a command-level error.
#[must_use]
pub fn map_send_error(err: &reqwest::Error, timeout: Duration) -> KeyprobeError {
    if err.is_timeout() {
        KeyprobeError::Timeout(timeout.as_secs())
    } else if err.is_connect() {
        KeyprobeError::Connection(err.to_string())
    } else {
        KeyprobeError::Network(err.to_string())
    }
}

// =============================================================================
// Probe Response
// =============================================================================

/// A fully-read provider response.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ProbeResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the parser's diagnostic when the body is not valid JSON.
    pub fn json(&self) -> std::result::Result<Value, String> {
        serde_json::from_str(&self.body).map_err(|e| e.to_string())
    }

    /// Integer value of a header, if present and numeric.
    #[must_use]
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    /// Provider error text for a non-2xx reply.
    #[must_use]
    pub fn error_message(&self) -> String {
        self.json()
            .ok()
            .and_then(|v| extract_error_message(&v))
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
    }
}

/// Send a request and read the whole body.
///
/// # Errors
///
/// Returns the transport error if the request could not be completed.
pub async fn send(request: RequestBuilder) -> std::result::Result<ProbeResponse, reqwest::Error> {
    let response = request.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await?;
    Ok(ProbeResponse {
        status,
        headers,
        body,
    })
}

/// Pull a human-readable message out of a provider error body.
///
/// Looks at `error.message`, then a string `error`, then top-level `message`.
#[must_use]
pub fn extract_error_message(body: &Value) -> Option<String> {
    let candidates = [
        body.pointer("/error/message"),
        body.get("error").filter(|v| v.is_string()),
        body.get("message"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Read a numeric field that may be encoded as a JSON number or string.
#[must_use]
pub fn lenient_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

/// Fetch JSON from a URL with an optional bearer token.
///
/// `timeout` bounds this request and is the value a timeout error reports.
///
/// # Errors
///
/// Returns error on network failure, non-2xx status, or JSON parse failure.
pub async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
    timeout: Duration,
) -> Result<T> {
    let mut request = client.get(url).timeout(timeout);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    let response = send(request)
        .await
        .map_err(|e| map_send_error(&e, timeout))?;

    if !response.is_success() {
        return Err(KeyprobeError::ProviderApi {
            provider: url.to_string(),
            status_code: Some(response.status.as_u16()),
            message: response.error_message(),
        });
    }

    serde_json::from_str(&response.body).map_err(|e| KeyprobeError::ParseResponse(e.to_string()))
}
