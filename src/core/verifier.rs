//! Verifier trait and provider registry.
//!
//! A [`Verifier`] probes one provider. The [`ProviderRegistry`] maps each
//! [`Provider`] to its verifier and is shared read-only by every worker of a
//! batch run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;

use super::http::DEFAULT_TIMEOUT;
use super::models::{BalanceInfo, VerificationResult};
use super::provider::Provider;
use crate::error::{KeyprobeError, Result};

/// Paid-only Gemini model used to tell paid keys from free ones.
pub const DEFAULT_GEMINI_PAID_MODEL: &str = "gemini-2.5-pro-preview-06-05";

/// Message for tasks whose provider could not be determined.
pub const UNRECOGNIZED_MESSAGE: &str = "unrecognized credential type";

// =============================================================================
// Verify Context
// =============================================================================

/// Per-run settings handed to every verifier call.
#[derive(Debug, Clone)]
pub struct VerifyContext {
    pub client: Client,
    pub timeout: Duration,
    /// Endpoint for the `custom` provider.
    pub endpoint: Option<String>,
    /// Model override for the `custom` provider only.
    pub model: Option<String>,
    /// Per-provider base URL overrides.
    pub api_bases: HashMap<Provider, String>,
    /// Per-provider model overrides from the config file.
    pub models: HashMap<Provider, String>,
    pub gemini_paid_model: String,
}

impl VerifyContext {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
            endpoint: None,
            model: None,
            api_bases: HashMap::new(),
            models: HashMap::new(),
            gemini_paid_model: DEFAULT_GEMINI_PAID_MODEL.to_string(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint.filter(|e| !e.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|m| !m.trim().is_empty());
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point a provider at a different base URL.
    #[must_use]
    pub fn with_api_base(mut self, provider: Provider, base: impl Into<String>) -> Self {
        self.api_bases.insert(provider, base.into());
        self
    }

    /// Base URL for `provider`, without a trailing slash.
    ///
    /// For `custom` this is the run's endpoint as given.
    #[must_use]
    pub fn api_base(&self, provider: Provider) -> Option<String> {
        let base = match provider {
            Provider::Custom => self
                .endpoint
                .clone()
                .or_else(|| self.api_bases.get(&provider).cloned()),
            _ => self
                .api_bases
                .get(&provider)
                .cloned()
                .or_else(|| provider.default_api_base().map(ToString::to_string)),
        }?;
        Some(base.trim().trim_end_matches('/').to_string())
    }

    /// Model used to check a `provider` credential.
    ///
    /// The run's `model` applies to `custom` only; a mixed batch keeps each
    /// known provider on its configured or default model.
    #[must_use]
    pub fn model_for(&self, provider: Provider) -> String {
        let run_model = match provider {
            Provider::Custom => self.model.clone(),
            _ => None,
        };
        run_model
            .or_else(|| self.models.get(&provider).cloned())
            .unwrap_or_else(|| provider.default_model().to_string())
    }
}

// =============================================================================
// Verifier Trait
// =============================================================================

/// A provider-specific credential probe.
pub trait Verifier: Send + Sync {
    /// Provider this verifier handles.
    fn provider(&self) -> Provider;

    /// Probe `credential`. Always resolves; failures are reported in the
    /// returned result.
    fn verify<'a>(
        &'a self,
        credential: &'a str,
        ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, VerificationResult>;

    /// Look up the remaining balance for `credential`.
    fn balance<'a>(
        &'a self,
        _credential: &'a str,
        _ctx: &'a VerifyContext,
    ) -> BoxFuture<'a, Result<BalanceInfo>> {
        let provider = self.provider();
        Box::pin(async move {
            Err(KeyprobeError::Unsupported {
                provider: provider.cli_name().to_string(),
                operation: "balance lookup".to_string(),
            })
        })
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Provider to verifier map. Read-only once built.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    verifiers: HashMap<Provider, Arc<dyn Verifier>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.verifiers.keys().collect();
        providers.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &providers)
            .finish()
    }
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verifier, replacing any previous one for its provider.
    #[must_use]
    pub fn register(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifiers.insert(verifier.provider(), verifier);
        self
    }

    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<&Arc<dyn Verifier>> {
        self.verifiers.get(&provider)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }

    /// Verify `credential` as `provider`.
    pub async fn verify(
        &self,
        provider: Provider,
        credential: &str,
        ctx: &VerifyContext,
    ) -> VerificationResult {
        let Some(verifier) = self.get(provider) else {
            tracing::error!(provider = %provider, "No verifier registered");
            return VerificationResult::fail(format!(
                "internal error: no verifier registered for {provider}"
            ));
        };
        verifier.verify(credential, ctx).await
    }

    /// Verify a classified task value. Unclassified values fail without any
    /// network call.
    pub async fn dispatch(
        &self,
        provider: Option<Provider>,
        credential: &str,
        ctx: &VerifyContext,
    ) -> VerificationResult {
        match provider {
            Some(provider) => self.verify(provider, credential, ctx).await,
            None => VerificationResult::fail(UNRECOGNIZED_MESSAGE),
        }
    }

    /// Balance lookup through the provider's verifier.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` when the provider has no balance endpoint or no
    /// verifier, otherwise the verifier's own error.
    pub async fn balance(
        &self,
        provider: Provider,
        credential: &str,
        ctx: &VerifyContext,
    ) -> Result<BalanceInfo> {
        let verifier = self.get(provider).ok_or_else(|| KeyprobeError::Unsupported {
            provider: provider.cli_name().to_string(),
            operation: "verification".to_string(),
        })?;
        verifier.balance(credential, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    struct Fixed(Provider, bool);

    impl Verifier for Fixed {
        fn provider(&self) -> Provider {
            self.0
        }

        fn verify<'a>(
            &'a self,
            credential: &'a str,
            _ctx: &'a VerifyContext,
        ) -> BoxFuture<'a, VerificationResult> {
            let ok = self.1;
            Box::pin(async move {
                if ok {
                    VerificationResult::ok(format!("ok {credential}"))
                } else {
                    VerificationResult::fail("nope")
                }
            })
        }
    }

    fn ctx() -> VerifyContext {
        VerifyContext::new(Client::new())
    }

    #[tokio::test]
    async fn dispatches_to_registered_verifier() {
        let registry = ProviderRegistry::new().register(Arc::new(Fixed(Provider::Groq, true)));
        let result = registry.dispatch(Some(Provider::Groq), "k", &ctx()).await;
        assert!(result.success);
        assert_eq!(result.message, "ok k");
    }

    #[tokio::test]
    async fn unclassified_is_unrecognized() {
        let registry = ProviderRegistry::new();
        let result = registry.dispatch(None, "k", &ctx()).await;
        assert!(!result.success);
        assert_eq!(result.message, UNRECOGNIZED_MESSAGE);
    }

    #[traced_test]
    #[tokio::test]
    async fn missing_entry_is_internal_error() {
        let registry = ProviderRegistry::new();
        let result = registry.verify(Provider::Xai, "k", &ctx()).await;
        assert!(!result.success);
        assert_eq!(result.message, "internal error: no verifier registered for xai");
        assert!(logs_contain("No verifier registered"));
    }

    #[tokio::test]
    async fn default_balance_is_unsupported() {
        let registry = ProviderRegistry::new().register(Arc::new(Fixed(Provider::Claude, true)));
        let err = tokio_test::assert_err!(registry.balance(Provider::Claude, "k", &ctx()).await);
        assert!(matches!(err, KeyprobeError::Unsupported { .. }));
    }

    #[test]
    fn api_base_trims_and_overrides() {
        let ctx = ctx()
            .with_api_base(Provider::OpenAI, "http://localhost:9999/")
            .with_endpoint(Some("https://relay.example.com/".to_string()));
        assert_eq!(
            ctx.api_base(Provider::OpenAI).as_deref(),
            Some("http://localhost:9999")
        );
        assert_eq!(
            ctx.api_base(Provider::Claude).as_deref(),
            Some("https://api.anthropic.com")
        );
        assert_eq!(
            ctx.api_base(Provider::Custom).as_deref(),
            Some("https://relay.example.com")
        );
    }

    #[test]
    fn model_precedence() {
        let mut ctx = ctx();
        assert_eq!(ctx.model_for(Provider::Xai), "grok-3-mini");
        ctx.models.insert(Provider::Xai, "grok-4".to_string());
        assert_eq!(ctx.model_for(Provider::Xai), "grok-4");
        let ctx = ctx.with_model(Some("grok-beta".to_string()));
        assert_eq!(ctx.model_for(Provider::Xai), "grok-4");
    }

    #[test]
    fn run_model_applies_to_custom_only() {
        let ctx = ctx().with_model(Some("relay-large".to_string()));
        assert_eq!(ctx.model_for(Provider::Custom), "relay-large");
        assert_eq!(ctx.model_for(Provider::Deepseek), Provider::Deepseek.default_model());
        assert_eq!(ctx.model_for(Provider::Claude), Provider::Claude.default_model());

        let mut ctx = ctx;
        ctx.models.insert(Provider::Custom, "from-config".to_string());
        assert_eq!(ctx.model_for(Provider::Custom), "relay-large");
    }
}
