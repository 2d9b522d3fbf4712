//! OpenAI verifier.
//!
//! Probes `POST /v1/chat/completions` and reads the usage tier from the
//! `x-ratelimit-limit-tokens` header. Any working key is treated as paid.

use futures::future::BoxFuture;

use crate::core::models::VerificationResult;
use crate::core::provider::Provider;
use crate::core::verifier::{Verifier, VerifyContext};
use crate::providers::openai_compat::{post_chat, require_base, valid_message};

/// Header carrying the per-minute token limit.
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-limit-tokens";

/// Map a token limit to OpenAI's usage tier label.
#[must_use]
pub fn tier_for_limit(tokens: u64) -> Option<&'static str> {
    match tokens {
        30_000 => Some("Tier1"),
        450_000 => Some("Tier2"),
        800_000 => Some("Tier3"),
        2_000_000 => Some("Tier4"),
        30_000_000 => Some("Tier5"),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiVerifier;

impl OpenAiVerifier {
    async fn run(&self, credential: &str, ctx: &VerifyContext) -> VerificationResult {
        let provider = Provider::OpenAI;
        let base = match require_base(ctx, provider) {
            Ok(base) => base,
            Err(failure) => return failure,
        };
        let model = ctx.model_for(provider);
        let url = format!("{base}/v1/chat/completions");

        match post_chat(ctx, provider, &url, credential, &model).await {
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

impl Verifier for OpenAiVerifier {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn verify<'a>(
        &'a self,
        credential: &'a str,
        ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, VerificationResult> {
        Box::pin(self.run(credential, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tiers() {
        assert_eq!(tier_for_limit(30_000), Some("Tier1"));
        assert_eq!(tier_for_limit(450_000), Some("Tier2"));
        assert_eq!(tier_for_limit(800_000), Some("Tier3"));
        assert_eq!(tier_for_limit(2_000_000), Some("Tier4"));
        assert_eq!(tier_for_limit(30_000_000), Some("Tier5"));
    }

    #[test]
    fn unknown_limit_has_no_tier() {
        assert_eq!(tier_for_limit(0), None);
        assert_eq!(tier_for_limit(200_000), None);
    }
}
