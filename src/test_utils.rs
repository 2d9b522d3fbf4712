//! Test utilities for keyprobe.
//!
//! Provides shared helpers, test data factories, and assertion macros
//! for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use keyprobe::test_utils::*;
//!
//! let key = sample_key(Provider::Deepseek);
//! let ctx = mock_context(&server.uri());
//! ```

use std::io::Write as IoWrite;

use tempfile::NamedTempFile;

use crate::core::models::{CredentialTask, VerificationResult};
use crate::core::provider::Provider;
use crate::core::verifier::VerifyContext;

// =============================================================================
// Test Data Factories
// =============================================================================

/// Deterministic alphanumeric filler of length `n`, varied by `seed`.
#[must_use]
pub fn alnum(n: usize, seed: u8) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    (0..n)
        .map(|i| CHARSET[(i * 7 + usize::from(seed) * 13) % CHARSET.len()] as char)
        .collect()
}

/// A credential that auto-classifies as `provider`.
///
/// `Custom` has no shape of its own; its sample is a short generic `sk-` key,
/// which auto-classifies as the fallback provider.
#[must_use]
pub fn sample_key(provider: Provider) -> String {
    sample_key_seeded(provider, 0)
}

/// Like [`sample_key`], with `seed` varying the body.
#[must_use]
pub fn sample_key_seeded(provider: Provider, seed: u8) -> String {
    match provider {
        Provider::OpenAI => format!("sk-proj-{}", alnum(48, seed)),
        Provider::Claude => format!("sk-ant-api03-{}", alnum(95, seed)),
        Provider::Gemini => format!("AIzaSy{}", alnum(33, seed)),
        Provider::Deepseek => format!("sk-{}", alnum(32, seed)),
        Provider::Groq => format!("gsk_{}", alnum(52, seed)),
        Provider::Siliconflow => format!("sk-{}", alnum(48, seed)),
        Provider::Xai => format!("xai-{}", alnum(80, seed)),
        Provider::Custom => format!("sk-{}", alnum(20, seed)),
    }
}

/// A verifier context with every provider pointed at `base_url`.
///
/// The custom endpoint is `base_url` as well.
#[must_use]
pub fn mock_context(base_url: &str) -> VerifyContext {
    Provider::ALL.iter().fold(
        VerifyContext::new(reqwest::Client::new()).with_endpoint(Some(base_url.to_string())),
        |ctx, &p| ctx.with_api_base(p, base_url),
    )
}

/// A task that has already been verified.
#[must_use]
pub fn make_finished_task(
    index: usize,
    raw: &str,
    provider: Option<Provider>,
    result: VerificationResult,
) -> CredentialTask {
    let mut task = CredentialTask::new(index, raw, provider);
    task.mark_checking();
    task.mark_finished(result);
    task
}

/// A valid task carrying a balance.
#[must_use]
pub fn make_valid_task_with_balance(index: usize, raw: &str, balance: Option<f64>) -> CredentialTask {
    let mut result = VerificationResult::ok("DeepSeek API key is valid").with_paid(true);
    result.balance = balance;
    result.currency = balance.map(|_| "CNY".to_string());
    make_finished_task(index, raw, Some(Provider::Deepseek), result)
}

/// A representative config file.
#[must_use]
pub fn make_test_config_toml() -> String {
    r#"[general]
timeout_seconds = 15
concurrency = 4

[classifier]
fallback_provider = "openai"

[providers.openai]
model = "gpt-4o-mini"

[custom]
endpoint = "https://relay.example.com"

[output]
color = false
"#
    .to_string()
}

/// Write `contents` to a temporary file that lives as long as the handle.
///
/// # Panics
///
/// Panics if the temporary file cannot be created or written.
#[must_use]
pub fn write_temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

// =============================================================================
// ANSI Helpers
// =============================================================================

/// Whether `text` contains ANSI escape sequences.
#[must_use]
pub fn has_ansi_codes(text: &str) -> bool {
    text.contains('\x1b')
}

/// Remove ANSI CSI sequences from `text`.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
///
/// # Examples
///
/// ```rust,ignore
/// use keyprobe::assert_contains;
///
/// let text = "Hello, world!";
/// assert_contains!(text, "world");
/// ```
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack: &str = &$haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        let haystack: &str = &$haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            $($arg)*
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack: &str = &$haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string is valid JSON.
///
/// # Examples
///
/// ```rust,ignore
/// use keyprobe::assert_json_valid;
///
/// let json = r#"{"key": "value"}"#;
/// assert_json_valid!(json);
/// ```
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {
        let json: &str = &$json;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(json) {
            panic!(
                "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                e, json
            );
        }
    };
}

/// Assert that a string contains ANSI escape codes.
#[macro_export]
macro_rules! assert_ansi_codes {
    ($text:expr) => {
        let text: &str = &$text;
        assert!(
            text.contains('\x1b'),
            "Expected string to contain ANSI escape codes, but none found.\n\nActual string:\n{:?}",
            text
        );
    };
}

/// Assert that a string does NOT contain ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        let text: &str = &$text;
        assert!(
            !text.contains('\x1b'),
            "Expected string to NOT contain ANSI escape codes.\n\nActual string:\n{:?}",
            text
        );
    };
}
