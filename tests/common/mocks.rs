//! wiremock responders for provider endpoints.
#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A minimal chat-completions success body.
#[must_use]
pub fn chat_ok(model: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": model,
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello"}}],
        "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
    })
}

/// An OpenAI-style error body.
#[must_use]
pub fn error_body(message: &str) -> Value {
    json!({"error": {"message": message, "type": "invalid_request_error"}})
}

/// Mount a `POST` responder at `route`.
pub async fn mount_post(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mount a `GET` responder at `route`.
pub async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// DeepSeek `/user/balance` body.
#[must_use]
pub fn deepseek_balance(total: &str, topped_up: &str, granted: &str) -> Value {
    json!({
        "is_available": true,
        "balance_infos": [{
            "currency": "CNY",
            "total_balance": total,
            "granted_balance": granted,
            "topped_up_balance": topped_up
        }]
    })
}

/// SiliconFlow `/v1/user/info` body.
#[must_use]
pub fn siliconflow_user_info(total: &str, charge: &str, gift: &str) -> Value {
    json!({
        "code": 20000,
        "message": "OK",
        "status": true,
        "data": {
            "id": "user-1",
            "balance": gift,
            "chargeBalance": charge,
            "totalBalance": total
        }
    })
}
