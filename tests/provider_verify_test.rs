//! Integration tests for provider verifiers against mock servers.
//!
//! Each test points every provider at a wiremock server and checks the
//! resulting `VerificationResult`: success messages, tiers, paid flags,
//! balances, and the failure messages for transport and API errors.

mod common;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use keyprobe::core::provider::Provider;
use keyprobe::core::verifier::{DEFAULT_GEMINI_PAID_MODEL, UNRECOGNIZED_MESSAGE, VerifyContext};
use keyprobe::error::KeyprobeError;
use keyprobe::providers::default_registry;
use keyprobe::test_utils::{mock_context, sample_key};

use common::logger::TestLogger;
use common::mocks::{
    chat_ok, deepseek_balance, error_body, mount_get, mount_post, siliconflow_user_info,
};

// =============================================================================
// OpenAI
// =============================================================================

#[tokio::test]
async fn openai_valid_key_reports_tier() {
    let log = TestLogger::new("openai_valid_key_reports_tier");
    log.phase("setup");
    let server = MockServer::start().await;
    let key = sample_key(Provider::OpenAI);
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", format!("Bearer {key}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-limit-tokens", "450000")
                .set_body_json(chat_ok("gpt-4o")),
        )
        .mount(&server)
        .await;

    log.phase("execute");
    let ctx = mock_context(&server.uri());
    let result = default_registry().verify(Provider::OpenAI, &key, &ctx).await;

    log.phase("verify");
    assert!(result.success, "{result:?}");
    assert_eq!(result.message, "OpenAI API key is valid (Tier2)");
    assert_eq!(result.tier.as_deref(), Some("Tier2"));
    assert_eq!(result.is_paid, Some(true));
    assert_eq!(result.model_used.as_deref(), Some("gpt-4o"));
    log.finish_ok();
}

#[tokio::test]
async fn openai_valid_key_without_rate_header_has_no_tier() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(200).set_body_json(chat_ok("gpt-4o")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::OpenAI, &sample_key(Provider::OpenAI), &ctx)
        .await;

    assert!(result.success);
    assert_eq!(result.message, "OpenAI API key is valid");
    assert_eq!(result.tier, None);
}

#[tokio::test]
async fn openai_rejected_key_carries_provider_message() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(401).set_body_json(error_body("Incorrect API key provided")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::OpenAI, &sample_key(Provider::OpenAI), &ctx)
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "OpenAI API error: Incorrect API key provided");
    assert_eq!(result.is_paid, None);
}

#[tokio::test]
async fn unparseable_error_body_is_unknown_error() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(500).set_body_string("<html>bad gateway</html>"),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Xai, &sample_key(Provider::Xai), &ctx)
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "xAI API error: unknown error");
}

#[tokio::test]
async fn transport_failure_is_reported_not_raised() {
    // nothing listens on port 9 (discard) in the test environment
    let ctx = mock_context("http://127.0.0.1:9");
    let result = default_registry()
        .verify(Provider::OpenAI, &sample_key(Provider::OpenAI), &ctx)
        .await;

    assert!(!result.success);
    assert!(result.message.starts_with("OpenAI error: "), "{}", result.message);
}

// =============================================================================
// Claude
// =============================================================================

#[tokio::test]
async fn claude_uses_api_key_header_and_reports_tier() {
    let server = MockServer::start().await;
    let key = sample_key(Provider::Claude);
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", key.as_str()))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("anthropic-ratelimit-input-tokens-limit", "80000")
                .set_body_json(json!({"type": "message", "content": []})),
        )
        .mount(&server)
        .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry().verify(Provider::Claude, &key, &ctx).await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.message, "Claude API key is valid (Tier2)");
    assert_eq!(result.tier.as_deref(), Some("Tier2"));
}

#[tokio::test]
async fn claude_error_uses_error_message_field() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/messages",
        ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Claude, &sample_key(Provider::Claude), &ctx)
        .await;

    assert_eq!(result.message, "Claude API error: invalid x-api-key");
}

// =============================================================================
// Gemini
// =============================================================================

fn gemini_path(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}

#[tokio::test]
async fn gemini_free_key_when_paid_probe_fails() {
    let server = MockServer::start().await;
    let key = sample_key(Provider::Gemini);
    Mock::given(method("POST"))
        .and(path(gemini_path(Provider::Gemini.default_model())))
        .and(query_param("key", key.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(gemini_path(DEFAULT_GEMINI_PAID_MODEL)))
        .respond_with(ResponseTemplate::new(429).set_body_json(error_body("quota exceeded")))
        .mount(&server)
        .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry().verify(Provider::Gemini, &key, &ctx).await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.message, "Gemini API key is valid (Free)");
    assert_eq!(result.is_paid, Some(false));
}

#[tokio::test]
async fn gemini_paid_key_when_both_probes_pass() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .expect(2)
        .mount(&server)
        .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Gemini, &sample_key(Provider::Gemini), &ctx)
        .await;

    assert_eq!(result.message, "Gemini API key is valid (Paid)");
    assert_eq!(result.is_paid, Some(true));
}

#[tokio::test]
async fn gemini_invalid_key_skips_paid_probe() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(error_body("API key not valid. Please pass a valid API key.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Gemini, &sample_key(Provider::Gemini), &ctx)
        .await;

    assert!(!result.success);
    assert!(result.message.starts_with("Gemini API error: API key not valid"));
}

// =============================================================================
// DeepSeek & SiliconFlow balances
// =============================================================================

#[tokio::test]
async fn deepseek_valid_key_includes_balance() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(200).set_body_json(chat_ok("deepseek-chat")),
    )
    .await;
    mount_get(
        &server,
        "/user/balance",
        ResponseTemplate::new(200).set_body_json(deepseek_balance("110.00", "100.00", "10.00")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Deepseek, &sample_key(Provider::Deepseek), &ctx)
        .await;

    assert!(result.success);
    assert_eq!(result.message, "DeepSeek API key is valid");
    assert_eq!(result.balance, Some(110.0));
    assert_eq!(result.charge_balance, Some(100.0));
    assert_eq!(result.gift_balance, Some(10.0));
    assert_eq!(result.currency.as_deref(), Some("CNY"));
}

#[tokio::test]
async fn deepseek_balance_failure_keeps_key_valid() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(200).set_body_json(chat_ok("deepseek-chat")),
    )
    .await;
    mount_get(&server, "/user/balance", ResponseTemplate::new(500)).await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Deepseek, &sample_key(Provider::Deepseek), &ctx)
        .await;

    assert!(result.success);
    assert_eq!(result.balance, None);
    assert_eq!(result.currency, None);
}

#[tokio::test]
async fn deepseek_insufficient_balance_is_invalid() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(402).set_body_json(error_body("Insufficient Balance")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Deepseek, &sample_key(Provider::Deepseek), &ctx)
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "DeepSeek API error: Insufficient Balance");
    // balance is never looked up for a failed probe
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.iter().all(|r| r.url.path() != "/user/balance"));
}

#[tokio::test]
async fn siliconflow_valid_key_includes_balance() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(200).set_body_json(chat_ok("Qwen/Qwen2.5-72B-Instruct")),
    )
    .await;
    mount_get(
        &server,
        "/v1/user/info",
        ResponseTemplate::new(200).set_body_json(siliconflow_user_info("14.5", "12", "2.5")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Siliconflow, &sample_key(Provider::Siliconflow), &ctx)
        .await;

    assert!(result.success);
    assert_eq!(result.message, "SiliconFlow API key is valid");
    assert_eq!(result.balance, Some(14.5));
    assert_eq!(result.charge_balance, Some(12.0));
    assert_eq!(result.gift_balance, Some(2.5));
}

#[tokio::test]
async fn registry_balance_lookup() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/v1/user/info",
        ResponseTemplate::new(200).set_body_json(siliconflow_user_info("3", "1", "2")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let balance = default_registry()
        .balance(Provider::Siliconflow, &sample_key(Provider::Siliconflow), &ctx)
        .await
        .expect("balance");
    assert_eq!(balance.total, Some(3.0));
    assert_eq!(balance.gift, Some(2.0));

    let err = default_registry()
        .balance(Provider::OpenAI, &sample_key(Provider::OpenAI), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, KeyprobeError::Unsupported { .. }));
}

// =============================================================================
// Groq, xAI
// =============================================================================

#[tokio::test]
async fn groq_free_tier_detected_from_token_limit() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/openai/v1/chat/completions",
        ResponseTemplate::new(200)
            .insert_header("x-ratelimit-limit-tokens", "6000")
            .set_body_json(chat_ok("llama-3.3-70b-versatile")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Groq, &sample_key(Provider::Groq), &ctx)
        .await;

    assert_eq!(result.message, "Groq API key is valid (free)");
    assert_eq!(result.is_paid, Some(false));
}

#[tokio::test]
async fn groq_other_limit_is_paid() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/openai/v1/chat/completions",
        ResponseTemplate::new(200)
            .insert_header("x-ratelimit-limit-tokens", "300000")
            .set_body_json(chat_ok("llama-3.3-70b-versatile")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Groq, &sample_key(Provider::Groq), &ctx)
        .await;

    assert_eq!(result.is_paid, Some(true));
}

#[tokio::test]
async fn xai_valid_key() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(200).set_body_json(chat_ok("grok-3-mini")),
    )
    .await;

    let ctx = mock_context(&server.uri());
    let result = default_registry()
        .verify(Provider::Xai, &sample_key(Provider::Xai), &ctx)
        .await;

    assert!(result.success);
    assert_eq!(result.message, "xAI API key is valid");
}

// =============================================================================
// Custom endpoint
// =============================================================================

#[tokio::test]
async fn custom_endpoint_reports_remaining_quota() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/v1/chat/completions",
        ResponseTemplate::new(200).set_body_json(chat_ok("gpt-3.5-turbo")),
    )
    .await;
    mount_get(
        &server,
        "/dashboard/billing/subscription",
        ResponseTemplate::new(200).set_body_json(json!({"hard_limit_usd": 120.0})),
    )
    .await;
    mount_get(
        &server,
        "/dashboard/billing/usage",
        ResponseTemplate::new(200).set_body_json(json!({"total_usage": 2050.0})),
    )
    .await;

    // trailing /v1/ is accepted
    let ctx = VerifyContext::new(reqwest::Client::new())
        .with_endpoint(Some(format!("{}/v1/", server.uri())));
    let result = default_registry()
        .verify(Provider::Custom, "sk-relaykey", &ctx)
        .await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.message, "Custom OpenAI-compatible endpoint is available");
    assert_eq!(result.balance, Some(99.5));
    assert_eq!(result.currency.as_deref(), Some("USD"));
    assert_eq!(result.is_paid, None);
}

#[tokio::test]
async fn custom_without_endpoint_fails_without_network() {
    let ctx = VerifyContext::new(reqwest::Client::new());
    let result = default_registry()
        .verify(Provider::Custom, "sk-relaykey", &ctx)
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "Custom error: no endpoint configured");
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn unclassified_value_makes_no_request() {
    let server = MockServer::start().await;
    let ctx = mock_context(&server.uri());

    let result = default_registry().dispatch(None, "hello world", &ctx).await;

    assert!(!result.success);
    assert_eq!(result.message, UNRECOGNIZED_MESSAGE);
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn model_override_reaches_custom_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(wiremock::matchers::body_partial_json(json!({"model": "relay-large"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_ok("relay-large")))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = mock_context(&server.uri()).with_model(Some("relay-large".to_string()));
    let result = default_registry()
        .verify(Provider::Custom, &sample_key(Provider::Custom), &ctx)
        .await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.model_used.as_deref(), Some("relay-large"));
}

#[tokio::test]
async fn model_override_leaves_openai_on_default_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(wiremock::matchers::body_partial_json(json!({"model": "gpt-4o"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_ok("gpt-4o")))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = mock_context(&server.uri()).with_model(Some("gpt-4o-mini".to_string()));
    let result = default_registry()
        .verify(Provider::OpenAI, &sample_key(Provider::OpenAI), &ctx)
        .await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.model_used.as_deref(), Some("gpt-4o"));
}
