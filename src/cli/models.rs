//! Models command implementation.

use crate::cli::args::ModelsArgs;
use crate::core::http;
use crate::core::model_catalog::{fetch_models, test_models};
use crate::core::scheduler::{DEFAULT_CONCURRENCY, normalize_concurrency};
use crate::error::{KeyprobeError, Result};
use crate::render::{self, ModelsReport};
use crate::storage::ResolvedConfig;

/// Execute the models command.
///
/// Lists the endpoint's models; with `--test` or `--test-all` also sends a
/// probe request to each selected model.
///
/// # Errors
///
/// Returns an error for a malformed endpoint or when the model list cannot
/// be fetched.
pub async fn execute(args: &ModelsArgs, config: &ResolvedConfig) -> Result<()> {
    let endpoint = args.endpoint.trim();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(KeyprobeError::InvalidInput(format!(
            "endpoint must start with http:// or https://: {endpoint}"
        )));
    }

    let client = http::build_client(config.timeout)?;
    let models = fetch_models(&client, endpoint, &args.key, config.timeout).await?;

    let selected: Vec<String> = if args.test_all {
        models.clone()
    } else {
        args.test.clone()
    };
    let concurrency = args
        .concurrency
        .as_deref()
        .map_or(DEFAULT_CONCURRENCY, normalize_concurrency);

    let tests = if selected.is_empty() {
        Vec::new()
    } else {
        tracing::info!(count = selected.len(), concurrency, "Testing models");
        test_models(
            &client,
            endpoint,
            &args.key,
            &selected,
            concurrency,
            config.timeout,
        )
        .await
    };

    let report = ModelsReport {
        endpoint: endpoint.to_string(),
        models,
        tests,
    };
    let output = render::render_models(&report, config.format, config.pretty, config.no_color)?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
