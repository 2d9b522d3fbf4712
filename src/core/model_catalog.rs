//! Model listing and per-model probing for OpenAI-compatible endpoints.

use std::time::{Duration, Instant};

use futures::StreamExt;
use futures::stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http;
use crate::error::{KeyprobeError, Result};
use crate::providers::custom::normalize_endpoint;
use crate::providers::openai_compat::chat_body;

/// Result of probing one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTestResult {
    pub model: String,
    pub ok: bool,

    /// Round-trip time; absent when the request never completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned_model: Option<String>,

    /// Whether the endpoint answered with the requested model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_match: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelTestResult {
    fn failed(model: &str, response_ms: Option<u64>, error: String) -> Self {
        Self {
            model: model.to_string(),
            ok: false,
            response_ms,
            returned_model: None,
            model_match: None,
            total_tokens: None,
            error: Some(error),
        }
    }
}

/// List model ids served by `endpoint`.
///
/// # Errors
///
/// Returns a network error (`Timeout` after `timeout`), `ProviderApi` on
/// non-2xx, or `ParseResponse` when `data` is missing.
pub async fn fetch_models(
    client: &Client,
    endpoint: &str,
    key: &str,
    timeout: Duration,
) -> Result<Vec<String>> {
    let url = format!("{}/models", normalize_endpoint(endpoint));
    let body: Value = http::fetch_json(client, &url, Some(key), timeout).await?;

    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| KeyprobeError::ParseResponse("missing 'data' array".to_string()))?;

    let models: Vec<String> = data
        .iter()
        .filter_map(|m| m.get("id").and_then(Value::as_str))
        .map(ToString::to_string)
        .collect();
    tracing::debug!(count = models.len(), "Fetched model list");
    Ok(models)
}

/// Send a minimal chat request for `model` and report what came back.
pub async fn test_model(
    client: &Client,
    endpoint: &str,
    key: &str,
    model: &str,
    timeout: Duration,
) -> ModelTestResult {
    let url = format!("{}/chat/completions", normalize_endpoint(endpoint));
    let started = Instant::now();
    let request = client
        .post(&url)
        .timeout(timeout)
        .bearer_auth(key)
        .json(&chat_body(model));

    let response = match http::send(request).await {
        Ok(response) => response,
        Err(err) => {
            let err = http::map_send_error(&err, timeout);
            return ModelTestResult::failed(model, None, err.to_string());
        }
    };
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    if !response.is_success() {
        return ModelTestResult::failed(model, Some(elapsed), response.error_message());
    }

    match response.json() {
        Ok(body) => {
            let returned = body
                .get("model")
                .and_then(Value::as_str)
                .map(ToString::to_string);
            ModelTestResult {
                model: model.to_string(),
                ok: true,
                response_ms: Some(elapsed),
                model_match: Some(returned.as_deref() == Some(model)),
                returned_model: returned,
                total_tokens: body.pointer("/usage/total_tokens").and_then(Value::as_u64),
                error: None,
            }
        }
        Err(err) => ModelTestResult::failed(model, Some(elapsed), format!("invalid response: {err}")),
    }
}

/// Probe several models with at most `concurrency` requests in flight.
///
/// Results come back in the order of `models`.
pub async fn test_models(
    client: &Client,
    endpoint: &str,
    key: &str,
    models: &[String],
    concurrency: usize,
    timeout: Duration,
) -> Vec<ModelTestResult> {
    stream::iter(models.iter())
        .map(|model| test_model(client, endpoint, key, model, timeout))
        .buffered(concurrency.max(1))
        .collect()
        .await
}
