//! Error rendering for keyprobe.
//!
//! Colored text with a hint for terminals, plain text otherwise, and
//! structured JSON for machine formats.

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::error::KeyprobeError;

// =============================================================================
// Public API
// =============================================================================

/// Render an error with full control over all formatting options.
///
/// JSON and Markdown formats get a JSON error document; human format gets
/// colored text when colors are enabled and stderr is a terminal.
#[must_use]
pub fn render_error_full(
    error: &KeyprobeError,
    format: OutputFormat,
    no_color: bool,
    pretty: bool,
) -> String {
    match format {
        OutputFormat::Json => return render_error_json(error, pretty),
        OutputFormat::Md => return render_error_json(error, true),
        OutputFormat::Human => {}
    }

    if !no_color && crate::util::env::stderr_is_tty() {
        render_colored(error)
    } else {
        render_simple(error)
    }
}

/// Render error as structured JSON for machine consumption.
#[must_use]
pub fn render_error_json(error: &KeyprobeError, pretty: bool) -> String {
    let error_json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&error_json)
    } else {
        serde_json::to_string(&error_json)
    };
    rendered.unwrap_or_else(|_| render_simple(error))
}

// =============================================================================
// Text Rendering
// =============================================================================

fn render_colored(error: &KeyprobeError) -> String {
    let mut lines = vec![format!(
        "{} {}",
        format!("error[{}]:", error.error_code()).red().bold(),
        error
    )];
    if let Some(hint) = error.hint() {
        lines.push(format!("  {} {hint}", "hint:".cyan()));
    }
    lines.join("\n")
}

fn render_simple(error: &KeyprobeError) -> String {
    let mut lines = vec![format!("Error [{}]: {}", error.error_code(), error)];
    if let Some(hint) = error.hint() {
        lines.push(format!("Hint: {hint}"));
    }
    lines.join("\n")
}

// =============================================================================
// JSON Rendering
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorJson {
    error_code: &'static str,
    category: String,
    message: String,
    is_retryable: bool,
    exit_code: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &KeyprobeError) -> Self {
        Self {
            error_code: error.error_code(),
            category: error.category().to_string(),
            message: error.to_string(),
            is_retryable: error.is_retryable(),
            exit_code: error.exit_code() as u8,
            hint: error.hint(),
        }
    }
}
