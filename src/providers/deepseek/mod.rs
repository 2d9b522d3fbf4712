//! DeepSeek verifier.
//!
//! Probes chat completions, then reads `/user/balance`. A failed balance
//! lookup leaves the balance empty and does not affect validity.

use futures::future::BoxFuture;
use serde_json::Value;

use crate::core::http::lenient_f64;
use crate::core::models::{BalanceInfo, VerificationResult};
use crate::core::provider::Provider;
use crate::core::verifier::{Verifier, VerifyContext};
use crate::error::{KeyprobeError, Result};
use crate::providers::openai_compat::{get_json, post_chat, require_base, valid_message};

/// Parse the `/user/balance` payload.
///
/// Uses the first entry of `balance_infos`.
///
/// # Errors
///
/// Returns `ParseResponse` if `balance_infos` is missing or empty.
pub fn parse_balance(body: &Value) -> Result<BalanceInfo> {
    let info = body
        .get("balance_infos")
        .and_then(Value::as_array)
        .and_then(|infos| infos.first())
        .ok_or_else(|| KeyprobeError::ParseResponse("missing balance_infos".to_string()))?;

    Ok(BalanceInfo {
        total: lenient_f64(info.get("total_balance")),
        charge: lenient_f64(info.get("topped_up_balance")),
        gift: lenient_f64(info.get("granted_balance")),
        currency: info
            .get("currency")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DeepseekVerifier;

impl DeepseekVerifier {
    async fn fetch_balance(&self, credential: &str, ctx: &VerifyContext) -> Result<BalanceInfo> {
        let base = ctx
            .api_base(Provider::Deepseek)
            .ok_or_else(|| KeyprobeError::Config("no DeepSeek base URL".to_string()))?;
        let body = get_json(ctx, Provider::Deepseek, &format!("{base}/user/balance"), credential)
            .await?;
        parse_balance(&body)
    }

    async fn run(&self, credential: &str, ctx: &VerifyContext) -> VerificationResult {
        let provider = Provider::Deepseek;
        let base = match require_base(ctx, provider) {
            Ok(base) => base,
            Err(failure) => return failure,
        };
        let model = ctx.model_for(provider);
        let url = format!("{base}/v1/chat/completions");

        if let Err(failure) = post_chat(ctx, provider, &url, credential, &model).await {
            return failure;
        }

        let mut result = VerificationResult::ok(valid_message(provider, None))
            .with_paid(true)
            .with_model(model);
        match self.fetch_balance(credential, ctx).await {
            Ok(balance) => result = result.with_balance(balance),
            Err(err) => {
                tracing::debug!(provider = %provider, error = %err, "Balance lookup failed");
            }
        }
        result
    }
}

impl Verifier for DeepseekVerifier {
    fn provider(&self) -> Provider {
        Provider::Deepseek
    }

    fn verify<'a>(
        &'a self,
        credential: &'a str,
        ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, VerificationResult> {
        Box::pin(self.run(credential, ctx))
    }

    fn balance<'a>(
        &'a self,
        credential: &'a str,
        ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, Result<BalanceInfo>> {
        Box::pin(self.fetch_balance(credential, ctx))
    }
}
