//! Custom OpenAI-compatible endpoint verifier.
//!
//! The endpoint comes from the run context. Quota is read from the
//! `dashboard/billing` pair exposed by most OpenAI-compatible relays.

use chrono::{Datelike, Local, NaiveDate};
use futures::future::BoxFuture;
use serde_json::Value;

use crate::core::http::lenient_f64;
use crate::core::models::{BalanceInfo, VerificationResult};
use crate::core::provider::Provider;
use crate::core::verifier::{Verifier, VerifyContext};
use crate::error::{KeyprobeError, Result};
use crate::providers::openai_compat::{get_json, post_chat, require_base};

/// Normalize a user-supplied endpoint to its `/v1` API root.
///
/// Trailing slashes are ignored; `/v1` is appended unless already present.
#[must_use]
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

/// Endpoint root used for the billing dashboard routes.
#[must_use]
pub fn endpoint_root(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    trimmed.strip_suffix("/v1").unwrap_or(trimmed).to_string()
}

/// Billing window from the first of the month to `today`.
#[must_use]
pub fn billing_window(today: NaiveDate) -> (String, String) {
    (
        format!("{:04}-{:02}-01", today.year(), today.month()),
        today.format("%Y-%m-%d").to_string(),
    )
}

/// Remaining quota in USD from the subscription and usage payloads.
///
/// `total_usage` is reported in cents.
#[must_use]
pub fn remaining_quota(subscription: &Value, usage: &Value) -> BalanceInfo {
    let hard_limit = lenient_f64(subscription.get("hard_limit_usd")).filter(|v| *v > 0.0);
    let used = lenient_f64(usage.get("total_usage")).map(|cents| cents / 100.0);
    BalanceInfo {
        total: hard_limit.map(|limit| limit - used.unwrap_or(0.0)),
        charge: None,
        gift: None,
        currency: Some("USD".to_string()),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CustomVerifier;

impl CustomVerifier {
    async fn fetch_quota(&self, credential: &str, ctx: &VerifyContext) -> Result<BalanceInfo> {
        let endpoint = ctx
            .api_base(Provider::Custom)
            .ok_or_else(|| KeyprobeError::Config("custom endpoint is not set".to_string()))?;
        let root = endpoint_root(&endpoint);
        let (start, end) = billing_window(Local::now().date_naive());

        let subscription = get_json(
            ctx,
            Provider::Custom,
            &format!("{root}/dashboard/billing/subscription"),
            credential,
        )
        .await?;
        let usage = get_json(
            ctx,
            Provider::Custom,
            &format!("{root}/dashboard/billing/usage?start_date={start}&end_date={end}"),
            credential,
        )
        .await?;

        Ok(remaining_quota(&subscription, &usage))
    }

    async fn run(&self, credential: &str, ctx: &VerifyContext) -> VerificationResult {
        let provider = Provider::Custom;
        let endpoint = match require_base(ctx, provider) {
            Ok(endpoint) => endpoint,
            Err(failure) => return failure,
        };
        let model = ctx.model_for(provider);
        let url = format!("{}/chat/completions", normalize_endpoint(&endpoint));

        if let Err(failure) = post_chat(ctx, provider, &url, credential, &model).await {
            return failure;
        }

        let mut result =
            VerificationResult::ok("Custom OpenAI-compatible endpoint is available").with_model(model);
        match self.fetch_quota(credential, ctx).await {
            Ok(balance) => result = result.with_balance(balance),
            Err(err) => {
                tracing::debug!(provider = %provider, error = %err, "Quota lookup failed");
            }
        }
        result
    }
}

impl Verifier for CustomVerifier {
    fn provider(&self) -> Provider {
        Provider::Custom
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
        Box::pin(self.fetch_quota(credential, ctx))
    }
}
