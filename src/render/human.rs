//! Human-readable output using colored.
//!
//! Renders check results as aligned tables with masked credentials.

use std::fmt::Write as _;

use colored::{Color, Colorize};

use super::{BalanceReport, BatchReport, CheckReport, ModelsReport};
use crate::core::aggregator::{SortDirection, Tally};
use crate::core::models::{CredentialTask, TaskStatus};
use crate::util::format::{format_amount, format_balance, mask_key};

/// Apply `color` unless colors are disabled.
fn paint(text: &str, color: Color, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        text.color(color).to_string()
    }
}

fn bold(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        text.bold().to_string()
    }
}

const fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Valid => Color::Green,
        TaskStatus::Invalid => Color::Red,
        TaskStatus::Checking => Color::Yellow,
        TaskStatus::Pending => Color::BrightBlack,
    }
}

fn plan_label(task: &CredentialTask) -> String {
    let plan = match task.is_paid {
        Some(true) => "paid",
        Some(false) => "free",
        None => "-",
    };
    match &task.tier {
        Some(tier) => format!("{plan} {tier}"),
        None => plan.to_string(),
    }
}

fn row_cells(task: &CredentialTask) -> [String; 6] {
    [
        (task.index + 1).to_string(),
        mask_key(&task.raw_value),
        task.provider
            .map_or_else(|| "-".to_string(), |p| p.display_name().to_string()),
        task.status.to_string(),
        plan_label(task),
        format_balance(task.balance, task.currency.as_deref()),
    ]
}

const HEADERS: [&str; 6] = ["#", "Key", "Provider", "Status", "Plan", "Balance"];

/// Render tasks as an aligned table followed by each task's message.
fn render_table(tasks: &[CredentialTask], no_color: bool) -> String {
    let rows: Vec<[String; 6]> = tasks.iter().map(row_cells).collect();
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    out.push_str(&bold(header.join("  ").trim_end(), no_color));
    out.push('\n');

    for (task, row) in tasks.iter().zip(&rows) {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                let padded = format!("{cell:<w$}");
                if i == 3 {
                    paint(&padded, status_color(task.status), no_color)
                } else {
                    padded
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
        if !task.result_message.is_empty() {
            let _ = writeln!(
                out,
                "{}",
                paint(&format!("    {}", task.result_message), Color::BrightBlack, no_color)
            );
        }
    }
    out
}

/// One-line summary of batch counters.
#[must_use]
pub fn render_tally(tally: &Tally, no_color: bool) -> String {
    format!(
        "{} total, {} valid, {} invalid, {} pending",
        bold(&tally.total.to_string(), no_color),
        paint(&tally.valid.to_string(), Color::Green, no_color),
        paint(&tally.invalid.to_string(), Color::Red, no_color),
        tally.pending + tally.checking,
    )
}

/// Progress line written to stderr as a batch task finishes.
#[must_use]
pub fn render_progress(task: &CredentialTask, tally: &Tally, no_color: bool) -> String {
    format!(
        "[{}/{}] #{} {} {}: {}",
        tally.completed,
        tally.total,
        task.index + 1,
        mask_key(&task.raw_value),
        paint(task.status.label(), status_color(task.status), no_color),
        task.result_message,
    )
}

/// Render a single check result.
#[must_use]
pub fn render_check(report: &CheckReport, no_color: bool) -> String {
    render_table(std::slice::from_ref(&report.task), no_color)
}

/// Render a finished batch.
#[must_use]
pub fn render_batch(report: &BatchReport, no_color: bool) -> String {
    let mut out = render_table(&report.tasks, no_color);
    out.push('\n');
    out.push_str(&render_tally(&report.tally, no_color));
    if let Some(sort) = report.sort {
        let arrow = match sort.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        let _ = write!(out, " (sorted by {} {arrow})", sort.column.label());
    }
    out.push('\n');
    if let Some(export) = &report.export {
        out.push('\n');
        out.push_str(export);
        if !export.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Render a model listing or test run.
#[must_use]
pub fn render_models(report: &ModelsReport, no_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} models)",
        bold(&report.endpoint, no_color),
        report.models.len()
    );

    if report.tests.is_empty() {
        for model in &report.models {
            let _ = writeln!(out, "  {model}");
        }
        return out;
    }

    for test in &report.tests {
        let mark = if test.ok {
            paint("ok  ", Color::Green, no_color)
        } else {
            paint("fail", Color::Red, no_color)
        };
        let timing = test
            .response_ms
            .map_or_else(String::new, |ms| format!(" {ms}ms"));
        let detail = match (&test.error, &test.returned_model) {
            (Some(err), _) => format!(" {err}"),
            (None, Some(returned)) if test.model_match == Some(false) => {
                format!(" returned {returned}")
            }
            _ => String::new(),
        };
        let _ = writeln!(out, "  {mark} {}{timing}{detail}", test.model);
    }
    let passed = report.tests.iter().filter(|t| t.ok).count();
    let _ = writeln!(out, "{passed}/{} models responded", report.tests.len());
    out
}

/// Render a balance lookup.
#[must_use]
pub fn render_balance(report: &BalanceReport, no_color: bool) -> String {
    let balance = &report.balance;
    let mut out = format!(
        "{}: {}\n",
        bold(report.provider.display_name(), no_color),
        paint(
            &format_balance(balance.total, balance.currency.as_deref()),
            Color::Cyan,
            no_color
        )
    );
    if let Some(charge) = balance.charge {
        let _ = writeln!(out, "  charge: {}", format_amount(charge));
    }
    if let Some(gift) = balance.gift {
        let _ = writeln!(out, "  gift: {}", format_amount(gift));
    }
    out
}
