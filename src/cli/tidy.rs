//! Tidy command implementation.

use crate::cli::args::TidyArgs;
use crate::cli::input::read_input;
use crate::core::provider::ProviderFilter;
use crate::core::tidy;
use crate::error::Result;
use crate::render::{self, TidyReport};
use crate::storage::ResolvedConfig;

/// Execute the tidy command.
///
/// # Errors
///
/// Returns an error if the input cannot be read or the provider is unknown.
pub fn execute(args: &TidyArgs, config: &ResolvedConfig) -> Result<()> {
    let text = read_input(args.file.as_deref())?;

    let report = if args.urls {
        TidyReport {
            kind: "urls".to_string(),
            values: tidy::extract_urls(&text),
        }
    } else {
        let filter = ProviderFilter::from_arg(&args.provider)?;
        TidyReport {
            kind: "credentials".to_string(),
            values: tidy::tidy(&text, filter),
        }
    };
    tracing::debug!(kind = %report.kind, count = report.values.len(), "Tidied input");

    let output = render::render_tidy(&report, config.format, config.pretty)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
