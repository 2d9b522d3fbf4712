//! Gemini verifier.
//!
//! The key goes in the `key` query parameter. A working key is probed a
//! second time against a paid-only model to tell paid keys from free ones.

use futures::future::BoxFuture;
use serde_json::{Value, json};

use crate::core::models::VerificationResult;
use crate::core::provider::Provider;
use crate::core::verifier::{Verifier, VerifyContext};
use crate::providers::openai_compat::{PROBE_PROMPT, probe, require_base, valid_message};

fn generate_body() -> Value {
    json!({
        "contents": [{"parts": [{"text": PROBE_PROMPT}]}],
    })
}

fn generate_url(base: &str, model: &str) -> String {
    format!("{base}/v1beta/models/{model}:generateContent")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiVerifier;

impl GeminiVerifier {
    async fn run(&self, credential: &str, ctx: &VerifyContext) -> VerificationResult {
        let provider = Provider::Gemini;
        let base = match require_base(ctx, provider) {
            Ok(base) => base,
            Err(failure) => return failure,
        };
        let model = ctx.model_for(provider);

        let request = ctx
            .client
            .post(generate_url(&base, &model))
            .query(&[("key", credential)])
            .json(&generate_body());
        if let Err(failure) = probe(provider, request).await {
            return failure;
        }

        let paid_request = ctx
            .client
            .post(generate_url(&base, &ctx.gemini_paid_model))
            .query(&[("key", credential)])
            .json(&generate_body());
        let paid = probe(provider, paid_request).await.is_ok();
        tracing::debug!(provider = %provider, paid, "Gemini paid probe finished");

        let label = if paid { "Paid" } else { "Free" };
        VerificationResult::ok(valid_message(provider, Some(label)))
            .with_paid(paid)
            .with_model(model)
    }
}

impl Verifier for GeminiVerifier {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn verify<'a>(
        &'a self,
        credential: &'a str,
        ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, VerificationResult> {
        Box::pin(self.run(credential, ctx))
    }
}
