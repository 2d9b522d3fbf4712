//! Check command implementation.

use crate::cli::args::CheckArgs;
use crate::core::http;
use crate::core::logging::Redacted;
use crate::core::models::CredentialTask;
use crate::error::{KeyprobeError, Result};
use crate::providers::default_registry;
use crate::render::{self, CheckReport};
use crate::storage::ResolvedConfig;

/// Execute the check command.
///
/// An invalid credential is a result, not a failure; the command still
/// exits successfully.
///
/// # Errors
///
/// Returns an error for a blank key, an unknown provider, or a client
/// construction failure.
pub async fn execute(args: &CheckArgs, config: &ResolvedConfig) -> Result<()> {
    let key = args.key.trim();
    if key.is_empty() {
        return Err(KeyprobeError::EmptyInput);
    }
    let filter = args.probe.filter()?;

    let client = http::build_client(config.timeout)?;
    let ctx = config.verify_context(client, args.probe.endpoint.clone(), args.probe.model.clone());
    let registry = default_registry();

    let provider = config.classifier().classify(key, filter);
    tracing::debug!(
        credential = %Redacted(key),
        provider = provider.map(|p| p.cli_name()),
        "Classified credential"
    );

    let mut task = CredentialTask::new(0, key, provider);
    task.mark_checking();
    let result = registry.dispatch(provider, key, &ctx).await;
    task.mark_finished(result);

    let output = render::render_check(
        &CheckReport { task },
        config.format,
        config.pretty,
        config.no_color,
    )?;
    println!("{output}");
    Ok(())
}
