//! Groq verifier.
//!
//! Groq serves an OpenAI-compatible API under `/openai/v1`. Free-tier keys
//! report a 6000 tokens-per-minute limit.

use futures::future::BoxFuture;

use crate::core::models::VerificationResult;
use crate::core::provider::Provider;
use crate::core::verifier::{Verifier, VerifyContext};
use crate::providers::openai_compat::{post_chat, require_base, valid_message};

/// Header carrying the per-minute token limit.
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-limit-tokens";

/// Token limit reported for free-tier keys.
pub const FREE_TIER_LIMIT: u64 = 6000;

#[derive(Debug, Default, Clone, Copy)]
pub struct GroqVerifier;

impl GroqVerifier {
    async fn run(&self, credential: &str, ctx: &VerifyContext) -> VerificationResult {
        let provider = Provider::Groq;
        let base = match require_base(ctx, provider) {
            Ok(base) => base,
            Err(failure) => return failure,
        };
        let model = ctx.model_for(provider);
        let url = format!("{base}/openai/v1/chat/completions");

        match post_chat(ctx, provider, &url, credential, &model).await {
            Ok(response) => {
                let paid = response.header_u64(RATE_LIMIT_HEADER) != Some(FREE_TIER_LIMIT);
                let label = if paid { "paid" } else { "free" };
                VerificationResult::ok(valid_message(provider, Some(label)))
                    .with_paid(paid)
                    .with_model(model)
            }
            Err(failure) => failure,
        }
    }
}

impl Verifier for GroqVerifier {
    fn provider(&self) -> Provider {
        Provider::Groq
    }

    fn verify<'a>(
        &'a self,
        credential: &'a str,
        ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, VerificationResult> {
        Box::pin(self.run(credential, ctx))
    }
}
