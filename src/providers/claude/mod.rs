//! Claude (Anthropic) verifier.
//!
//! Probes `POST /v1/messages` with the `x-api-key` header. The tier comes
//! from `anthropic-ratelimit-input-tokens-limit`.

use futures::future::BoxFuture;
use serde_json::json;

use crate::core::models::VerificationResult;
use crate::core::provider::Provider;
use crate::core::verifier::{Verifier, VerifyContext};
use crate::providers::openai_compat::{
    PROBE_MAX_TOKENS, PROBE_PROMPT, probe, require_base, valid_message,
};

/// Anthropic API version sent with every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Header carrying the input-token rate limit.
pub const RATE_LIMIT_HEADER: &str = "anthropic-ratelimit-input-tokens-limit";

/// Map an input-token limit to Anthropic's build tier.
#[must_use]
pub fn tier_for_limit(tokens: u64) -> Option<&'static str> {
    match tokens {
        40_000 => Some("Tier1"),
        80_000 => Some("Tier2"),
        160_000 => Some("Tier3"),
        400_000 => Some("Tier4"),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ClaudeVerifier;

impl ClaudeVerifier {
    async fn run(&self, credential: &str, ctx: &VerifyContext) -> VerificationResult {
        let provider = Provider::Claude;
        let base = match require_base(ctx, provider) {
            Ok(base) => base,
            Err(failure) => return failure,
        };
        let model = ctx.model_for(provider);

        let request = ctx
            .client
            .post(format!("{base}/v1/messages"))
            .header("x-api-key", credential)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": model,
                "messages": [{"role": "user", "content": PROBE_PROMPT}],
                "max_tokens": PROBE_MAX_TOKENS,
            }));

        match probe(provider, request).await {
            Ok(response) => {
                let tier = response.header_u64(RATE_LIMIT_HEADER).and_then(tier_for_limit);
                VerificationResult::ok(valid_message(provider, tier))
                    .with_paid(true)
                    .with_tier(tier.map(ToString::to_string))
                    .with_model(model)
            }
            Err(failure) => failure,
        }
    }
}

impl Verifier for ClaudeVerifier {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    fn verify<'a>(
        &'a self,
        credential: &'a str,
        ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, VerificationResult> {
        Box::pin(self.run(credential, ctx))
    }
}
