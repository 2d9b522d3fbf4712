//! Output rendering for human and robot modes.

pub mod error;
pub mod human;
pub mod robot;

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::core::aggregator::{SortState, Tally};
use crate::core::model_catalog::ModelTestResult;
use crate::core::models::{BalanceInfo, CredentialTask};
use crate::core::provider::Provider;
use crate::error::Result;

// =============================================================================
// Reports
// =============================================================================

/// Result of `keyprobe check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub task: CredentialTask,
}

/// Result of `keyprobe batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub tally: Tally,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortState>,

    /// Tasks in display order.
    pub tasks: Vec<CredentialTask>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<String>,
}

/// Result of `keyprobe tidy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidyReport {
    /// `credentials` or `urls`.
    pub kind: String,
    pub values: Vec<String>,
}

/// Result of `keyprobe models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsReport {
    pub endpoint: String,
    pub models: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<ModelTestResult>,
}

/// Result of `keyprobe balance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub provider: Provider,
    pub balance: BalanceInfo,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Render a single check.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_check(
    report: &CheckReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_check(report, no_color)),
        OutputFormat::Json => robot::render_envelope("check", report, Vec::new(), pretty),
        OutputFormat::Md => Ok(robot::render_check_md(report)),
    }
}

/// Render a finished batch.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_batch(
    report: &BatchReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_batch(report, no_color)),
        OutputFormat::Json => robot::render_envelope("batch", report, Vec::new(), pretty),
        OutputFormat::Md => Ok(robot::render_batch_md(report)),
    }
}

/// Render tidied values.
///
/// Human output is one value per line so it can be piped back into `batch`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_tidy(report: &TidyReport, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(report.values.join("\n")),
        OutputFormat::Json => robot::render_envelope("tidy", report, Vec::new(), pretty),
        OutputFormat::Md => Ok(robot::render_tidy_md(report)),
    }
}

/// Render a model listing or model test run.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_models(
    report: &ModelsReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_models(report, no_color)),
        OutputFormat::Json => robot::render_envelope("models", report, Vec::new(), pretty),
        OutputFormat::Md => Ok(robot::render_models_md(report)),
    }
}

/// Render a balance lookup.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_balance(
    report: &BalanceReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_balance(report, no_color)),
        OutputFormat::Json => robot::render_envelope("balance", report, Vec::new(), pretty),
        OutputFormat::Md => Ok(robot::render_balance_md(report)),
    }
}
