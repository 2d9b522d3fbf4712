//! SiliconFlow verifier.
//!
//! Probes chat completions, then reads `/v1/user/info` for the account
//! balance. Balances are always in CNY.

use futures::future::BoxFuture;
use serde_json::Value;

use crate::core::http::{extract_error_message, lenient_f64};
use crate::core::models::{BalanceInfo, VerificationResult};
use crate::core::provider::Provider;
use crate::core::verifier::{Verifier, VerifyContext};
use crate::error::{KeyprobeError, Result};
use crate::providers::openai_compat::{get_json, post_chat, require_base, valid_message};

/// Success code in the user-info envelope.
pub const USER_INFO_OK: i64 = 20000;

/// Parse the `/v1/user/info` envelope.
///
/// # Errors
///
/// Returns `ProviderApi` unless `status` is true and `code` is 20000.
pub fn parse_user_info(body: &Value) -> Result<BalanceInfo> {
    let status_ok = body.get("status").and_then(Value::as_bool) == Some(true);
    let code_ok = body.get("code").and_then(Value::as_i64) == Some(USER_INFO_OK);
    if !(status_ok && code_ok) {
        return Err(KeyprobeError::ProviderApi {
            provider: Provider::Siliconflow.display_name().to_string(),
            status_code: None,
            message: extract_error_message(body)
                .unwrap_or_else(|| crate::core::http::UNKNOWN_ERROR.to_string()),
        });
    }

    let data = body.get("data").unwrap_or(&Value::Null);
    Ok(BalanceInfo {
        total: lenient_f64(data.get("totalBalance")),
        charge: lenient_f64(data.get("chargeBalance")),
        gift: lenient_f64(data.get("balance")),
        currency: Some("CNY".to_string()),
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SiliconflowVerifier;

impl SiliconflowVerifier {
    async fn fetch_balance(&self, credential: &str, ctx: &VerifyContext) -> Result<BalanceInfo> {
        let base = ctx
            .api_base(Provider::Siliconflow)
            .ok_or_else(|| KeyprobeError::Config("no SiliconFlow base URL".to_string()))?;
        let body = get_json(
            ctx,
            Provider::Siliconflow,
            &format!("{base}/v1/user/info"),
            credential,
        )
        .await?;
        parse_user_info(&body)
    }

    async fn run(&self, credential: &str, ctx: &VerifyContext) -> VerificationResult {
        let provider = Provider::Siliconflow;
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

impl Verifier for SiliconflowVerifier {
    fn provider(&self) -> Provider {
        Provider::Siliconflow
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
