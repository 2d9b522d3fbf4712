//! Balance command implementation.

use crate::cli::args::BalanceArgs;
use crate::core::http;
use crate::core::logging::Redacted;
use crate::core::provider::ProviderFilter;
use crate::error::{KeyprobeError, Result};
use crate::providers::default_registry;
use crate::render::{self, BalanceReport};
use crate::storage::ResolvedConfig;

/// Execute the balance command.
///
/// # Errors
///
/// Returns `Unsupported` for providers without a balance endpoint, or the
/// lookup's network or API error.
pub async fn execute(args: &BalanceArgs, config: &ResolvedConfig) -> Result<()> {
    let key = args.key.trim();
    if key.is_empty() {
        return Err(KeyprobeError::EmptyInput);
    }

    let provider = match args.provider()? {
        Some(provider) => provider,
        None => config
            .classifier()
            .classify(key, ProviderFilter::Auto)
            .ok_or_else(|| {
                KeyprobeError::InvalidInput("unrecognized credential type".to_string())
            })?,
    };
    if !provider.supports_balance() {
        return Err(KeyprobeError::Unsupported {
            provider: provider.cli_name().to_string(),
            operation: "balance lookup".to_string(),
        });
    }

    tracing::debug!(credential = %Redacted(key), provider = %provider, "Looking up balance");

    let client = http::build_client(config.timeout)?;
    let ctx = config.verify_context(client, args.endpoint.clone(), None);
    let balance = default_registry().balance(provider, key, &ctx).await?;

    let report = BalanceReport { provider, balance };
    let output = render::render_balance(&report, config.format, config.pretty, config.no_color)?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
