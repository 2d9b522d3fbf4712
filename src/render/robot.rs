//! Robot-mode output (JSON and Markdown).
//!
//! Provides stable, token-efficient output for scripts and agents. Every JSON
//! document is wrapped in a [`RobotOutput`] envelope.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BalanceReport, BatchReport, CheckReport, ModelsReport, TidyReport};
use crate::core::models::CredentialTask;
use crate::error::Result;
use crate::util::format::{format_amount, format_balance};

/// Schema identifier carried by every envelope.
pub const SCHEMA_VERSION: &str = "keyprobe.v1";

/// Robot output envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub command: String,
    pub generated_at: DateTime<Utc>,
    pub data: T,

    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> RobotOutput<T> {
    /// Create a new robot output envelope.
    pub fn new(command: impl Into<String>, data: T) -> Self {
        Self::with_errors(command, data, Vec::new())
    }

    /// Create with errors.
    pub fn with_errors(command: impl Into<String>, data: T, errors: Vec<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.into(),
            generated_at: Utc::now(),
            data,
            errors,
        }
    }
}

/// Render any serializable value as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json<T: Serialize>(output: &T) -> Result<String> {
    Ok(serde_json::to_string(output)?)
}

/// Render any serializable value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json_pretty<T: Serialize>(output: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

/// Wrap `data` in an envelope and render it.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_envelope<T: Serialize>(
    command: &str,
    data: T,
    errors: Vec<String>,
    pretty: bool,
) -> Result<String> {
    let output = RobotOutput::with_errors(command, data, errors);
    if pretty {
        render_json_pretty(&output)
    } else {
        render_json(&output)
    }
}

// =============================================================================
// Markdown
// =============================================================================

fn task_row(out: &mut String, task: &CredentialTask) {
    let provider = task.provider.map_or("-", |p| p.display_name());
    let paid = match task.is_paid {
        Some(true) => "paid",
        Some(false) => "free",
        None => "-",
    };
    let _ = writeln!(
        out,
        "| {} | `{}` | {} | {} | {} | {} | {} | {} |",
        task.index + 1,
        task.raw_value,
        provider,
        task.status,
        paid,
        format_balance(task.balance, task.currency.as_deref()),
        task.tier.as_deref().unwrap_or("-"),
        task.result_message.replace('|', "\\|"),
    );
}

fn task_table(out: &mut String, tasks: &[CredentialTask]) {
    out.push_str("| # | key | provider | status | plan | balance | tier | message |\n");
    out.push_str("|---|-----|----------|--------|------|---------|------|---------|\n");
    for task in tasks {
        task_row(out, task);
    }
}

/// Render a single check as Markdown.
#[must_use]
pub fn render_check_md(report: &CheckReport) -> String {
    let mut out = String::from("## keyprobe check\n\n");
    task_table(&mut out, std::slice::from_ref(&report.task));
    out
}

/// Render a batch as Markdown.
#[must_use]
pub fn render_batch_md(report: &BatchReport) -> String {
    let mut out = String::from("## keyprobe batch\n\n");
    let tally = &report.tally;
    let _ = writeln!(
        out,
        "- total: {}\n- valid: {}\n- invalid: {}\n- completed: {}\n",
        tally.total, tally.valid, tally.invalid, tally.completed
    );
    task_table(&mut out, &report.tasks);
    if let Some(export) = &report.export {
        out.push_str("\n### Export\n\n```\n");
        out.push_str(export);
        if !export.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n");
    }
    out
}

/// Render tidied values as Markdown.
#[must_use]
pub fn render_tidy_md(report: &TidyReport) -> String {
    let mut out = format!("## keyprobe tidy ({})\n\n", report.kind);
    for value in &report.values {
        let _ = writeln!(out, "- `{value}`");
    }
    out
}

/// Render a model listing as Markdown.
#[must_use]
pub fn render_models_md(report: &ModelsReport) -> String {
    let mut out = format!("## Models at {}\n\n", report.endpoint);
    if report.tests.is_empty() {
        for model in &report.models {
            let _ = writeln!(out, "- {model}");
        }
        return out;
    }

    out.push_str("| model | ok | ms | returned | tokens | error |\n");
    out.push_str("|-------|----|----|----------|--------|-------|\n");
    for test in &report.tests {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            test.model,
            if test.ok { "yes" } else { "no" },
            test.response_ms.map_or_else(|| "-".to_string(), |ms| ms.to_string()),
            test.returned_model.as_deref().unwrap_or("-"),
            test.total_tokens.map_or_else(|| "-".to_string(), |t| t.to_string()),
            test.error.as_deref().unwrap_or("").replace('|', "\\|"),
        );
    }
    out
}

/// Render a balance lookup as Markdown.
#[must_use]
pub fn render_balance_md(report: &BalanceReport) -> String {
    let currency = report.balance.currency.as_deref();
    let mut out = format!("## {} balance\n\n", report.provider.display_name());
    let _ = writeln!(out, "- total: {}", format_balance(report.balance.total, currency));
    if let Some(charge) = report.balance.charge {
        let _ = writeln!(out, "- charge: {}", format_amount(charge));
    }
    if let Some(gift) = report.balance.gift {
        let _ = writeln!(out, "- gift: {}", format_amount(gift));
    }
    out
}
