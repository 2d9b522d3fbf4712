//! Export formatting for finished batches.
//!
//! Produces plain text meant to be copied back into another tool. No I/O
//! happens here; the caller decides where the text goes.

use serde::{Deserialize, Serialize};

use super::models::{CredentialTask, TaskStatus};
use crate::error::{KeyprobeError, Result};
use crate::util::format::format_amount;

/// Separator between a credential and its annotation.
pub const SEPARATOR: &str = " ---- ";

/// What to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMode {
    /// Valid keys split into `Paid:` and `Free:` sections.
    #[default]
    ValidGrouped,
    /// Valid keys only, one per line.
    ValidKeysOnly,
    /// Invalid keys with their failure message.
    InvalidOnly,
    /// Every key with its message.
    All,
}

impl ExportMode {
    /// Parse from CLI argument.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown modes.
    pub fn from_arg(arg: &str) -> Result<Self> {
        match arg.trim().to_lowercase().as_str() {
            "valid-grouped" | "grouped" => Ok(Self::ValidGrouped),
            "valid-keys-only" | "valid" => Ok(Self::ValidKeysOnly),
            "invalid-only" | "invalid" => Ok(Self::InvalidOnly),
            "all" => Ok(Self::All),
            other => Err(KeyprobeError::InvalidInput(format!(
                "unknown export mode '{other}'"
            ))),
        }
    }
}

fn balance_annotation(task: &CredentialTask) -> Option<String> {
    let balance = task.balance?;
    let currency = task
        .currency
        .as_deref()
        .map(|c| format!(" {c}"))
        .unwrap_or_default();
    let mut line = format!("balance: {}{currency}", format_amount(balance));

    let parts: Vec<String> = [
        ("charge", task.sub_balances.charge),
        ("gift", task.sub_balances.gift),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{label}: {}", format_amount(v))))
    .collect();
    if !parts.is_empty() {
        line.push_str(&format!(" ({})", parts.join(", ")));
    }
    Some(line)
}

fn grouped(tasks: &[CredentialTask]) -> String {
    let valid = tasks.iter().filter(|t| t.status == TaskStatus::Valid);
    let (paid, free): (Vec<_>, Vec<_>) = valid.partition(|t| t.is_paid == Some(true));

    let mut sections = Vec::new();
    if !paid.is_empty() {
        let mut section = String::from("Paid:");
        for task in paid {
            section.push('\n');
            section.push_str(&task.raw_value);
            if let Some(note) = balance_annotation(task) {
                section.push_str(SEPARATOR);
                section.push_str(&note);
            }
        }
        sections.push(section);
    }
    if !free.is_empty() {
        let mut section = String::from("Free:");
        for task in free {
            section.push('\n');
            section.push_str(&task.raw_value);
        }
        sections.push(section);
    }
    sections.join("\n\n")
}

fn with_messages<'a>(tasks: impl Iterator<Item = &'a CredentialTask>) -> String {
    tasks
        .map(|t| format!("{}{SEPARATOR}{}", t.raw_value, t.result_message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format `tasks` (expected in input order) for export.
#[must_use]
pub fn format(tasks: &[CredentialTask], mode: ExportMode) -> String {
    let text = match mode {
        ExportMode::ValidGrouped => grouped(tasks),
        ExportMode::ValidKeysOnly => tasks
            .iter()
            .filter(|t| t.is_valid())
            .map(|t| t.raw_value.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        ExportMode::InvalidOnly => {
            with_messages(tasks.iter().filter(|t| t.status == TaskStatus::Invalid))
        }
        ExportMode::All => with_messages(tasks.iter()),
    };
    text.trim_end().to_string()
}
