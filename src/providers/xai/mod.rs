//! xAI verifier.

use futures::future::BoxFuture;

use crate::core::models::VerificationResult;
use crate::core::provider::Provider;
use crate::core::verifier::{Verifier, VerifyContext};
use crate::providers::openai_compat::{post_chat, require_base, valid_message};

#[derive(Debug, Default, Clone, Copy)]
pub struct XaiVerifier;

impl XaiVerifier {
    async fn run(&self, credential: &str, ctx: &VerifyContext) -> VerificationResult {
        let provider = Provider::Xai;
        let base = match require_base(ctx, provider) {
            Ok(base) => base,
            Err(failure) => return failure,
        };
        let model = ctx.model_for(provider);
        let url = format!("{base}/v1/chat/completions");

        match post_chat(ctx, provider, &url, credential, &model).await {
            Ok(_) => VerificationResult::ok(valid_message(provider, None))
                .with_paid(true)
                .with_model(model),
            Err(failure) => failure,
        }
    }
}

impl Verifier for XaiVerifier {
    fn provider(&self) -> Provider {
        Provider::Xai
    }

    fn verify<'a>(
        &'a self,
        credential: &'a str,
        ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, VerificationResult> {
        Box::pin(self.run(credential, ctx))
    }
}
