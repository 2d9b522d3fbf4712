//! Shared probe plumbing for chat-completions style APIs.
//!
//! Most providers accept an OpenAI-compatible `chat/completions` request with
//! a bearer token. The helpers here send the minimal probe and translate the
//! transport and HTTP outcomes into [`VerificationResult`] failures.

use std::time::Instant;

use reqwest::RequestBuilder;
use serde_json::{Value, json};

use crate::core::http::{self, ProbeResponse};
use crate::core::models::VerificationResult;
use crate::core::provider::Provider;
use crate::core::verifier::VerifyContext;
use crate::error::KeyprobeError;

/// Prompt sent with every probe.
pub const PROBE_PROMPT: &str = "Hi";

/// Token cap for probe completions.
pub const PROBE_MAX_TOKENS: u32 = 10;

/// Body of a minimal chat-completions request.
#[must_use]
pub fn chat_body(model: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": PROBE_PROMPT}],
        "max_tokens": PROBE_MAX_TOKENS,
    })
}

/// Failure for a request that never produced an HTTP response.
#[must_use]
pub fn transport_failure(provider: Provider, err: &reqwest::Error) -> VerificationResult {
    VerificationResult::fail(format!("{} error: {err}", provider.display_name()))
}

/// Failure for a non-2xx response.
#[must_use]
pub fn api_failure(provider: Provider, response: &ProbeResponse) -> VerificationResult {
    VerificationResult::fail(format!(
        "{} API error: {}",
        provider.display_name(),
        response.error_message()
    ))
}

/// Success message, with an optional qualifier such as a tier.
#[must_use]
pub fn valid_message(provider: Provider, qualifier: Option<&str>) -> String {
    match qualifier {
        Some(q) if !q.is_empty() => format!("{} API key is valid ({q})", provider.display_name()),
        _ => format!("{} API key is valid", provider.display_name()),
    }
}

/// Send a probe and keep only 2xx responses.
///
/// # Errors
///
/// Returns a ready-made failed [`VerificationResult`] on transport errors or
/// non-2xx status codes.
pub async fn probe(
    provider: Provider,
    request: RequestBuilder,
) -> Result<ProbeResponse, VerificationResult> {
    let started = Instant::now();
    let response = match http::send(request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(
                provider = %provider,
                error = %err,
                duration_ms = started.elapsed().as_millis() as u64,
                "Probe transport failure"
            );
            return Err(transport_failure(provider, &err));
        }
    };

    tracing::debug!(
        provider = %provider,
        status = response.status.as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Probe response"
    );

    if response.is_success() {
        Ok(response)
    } else {
        Err(api_failure(provider, &response))
    }
}

/// POST a chat-completions probe to `url` with a bearer token.
///
/// # Errors
///
/// See [`probe`].
pub async fn post_chat(
    ctx: &VerifyContext,
    provider: Provider,
    url: &str,
    credential: &str,
    model: &str,
) -> Result<ProbeResponse, VerificationResult> {
    let request = ctx
        .client
        .post(url)
        .bearer_auth(credential)
        .json(&chat_body(model));
    probe(provider, request).await
}

/// GET a JSON document with a bearer token.
///
/// Used for billing endpoints, whose failures surface as errors rather than
/// verification results.
///
/// # Errors
///
/// Returns a network error, `ProviderApi` for non-2xx, or `ParseResponse`
/// for a malformed body.
pub async fn get_json(
    ctx: &VerifyContext,
    provider: Provider,
    url: &str,
    credential: &str,
) -> crate::error::Result<Value> {
    let response = http::send(ctx.client.get(url).bearer_auth(credential))
        .await
        .map_err(|e| http::map_send_error(&e, ctx.timeout))?;

    if !response.is_success() {
        return Err(KeyprobeError::ProviderApi {
            provider: provider.display_name().to_string(),
            status_code: Some(response.status.as_u16()),
            message: response.error_message(),
        });
    }

    response.json().map_err(KeyprobeError::ParseResponse)
}

/// Base URL for `provider` or a failure if none is configured.
///
/// # Errors
///
/// Returns a failed result when the provider has no base URL.
pub fn require_base(ctx: &VerifyContext, provider: Provider) -> Result<String, VerificationResult> {
    ctx.api_base(provider).ok_or_else(|| {
        VerificationResult::fail(format!(
            "{} error: no endpoint configured",
            provider.display_name()
        ))
    })
}
