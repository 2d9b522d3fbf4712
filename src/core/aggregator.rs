//! Batch run state: task records, tallies and the sort engine.
//!
//! All mutation goes through [`BatchRunState`], which is shared between the
//! scheduler's sink and the presentation layer as [`SharedRunState`]. Every
//! batch gets a generation number; updates tagged with an older generation
//! are ignored.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::models::{CredentialTask, TaskStatus, VerificationResult};
use crate::error::{KeyprobeError, Result};

/// Run state shared between workers and the renderer.
pub type SharedRunState = Arc<Mutex<BatchRunState>>;

// =============================================================================
// Sort Keys
// =============================================================================

/// Column a batch can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Index,
    Balance,
    Charge,
    Gift,
}

impl SortColumn {
    /// Parse from CLI argument.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown column names.
    pub fn from_arg(arg: &str) -> Result<Self> {
        match arg.trim().to_lowercase().as_str() {
            "index" | "#" => Ok(Self::Index),
            "balance" => Ok(Self::Balance),
            "charge" => Ok(Self::Charge),
            "gift" => Ok(Self::Gift),
            other => Err(KeyprobeError::InvalidInput(format!(
                "unknown sort column '{other}' (expected index, balance, charge or gift)"
            ))),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Balance => "balance",
            Self::Charge => "charge",
            Self::Gift => "gift",
        }
    }

    fn value(self, task: &CredentialTask) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Index => Some(task.index as f64),
            Self::Balance => task.balance,
            Self::Charge => task.sub_balances.charge,
            Self::Gift => task.sub_balances.gift,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Parse from CLI argument.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for anything other than asc/desc.
    pub fn from_arg(arg: &str) -> Result<Self> {
        match arg.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(KeyprobeError::InvalidInput(format!(
                "unknown sort direction '{other}' (expected asc or desc)"
            ))),
        }
    }
}

/// Active sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// Compare two tasks: status priority first, then the column value with
/// missing values last in either direction.
fn compare(a: &CredentialTask, b: &CredentialTask, sort: SortState) -> Ordering {
    a.status
        .priority()
        .cmp(&b.status.priority())
        .then_with(|| match (sort.column.value(a), sort.column.value(b)) {
            (Some(x), Some(y)) => {
                let ord = x.total_cmp(&y);
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

// =============================================================================
// Tally
// =============================================================================

/// Counter snapshot for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub total: usize,
    pub completed: usize,
    pub valid: usize,
    pub invalid: usize,
    pub checking: usize,
    pub pending: usize,
}

// =============================================================================
// Batch Run State
// =============================================================================

/// Mutable state of the current batch.
#[derive(Debug, Default)]
pub struct BatchRunState {
    generation: u64,
    /// Tasks in input order; `tasks[i].index == i`.
    tasks: Vec<CredentialTask>,
    /// Display order as indices into `tasks`.
    order: Vec<usize>,
    sort: Option<SortState>,
    completed: usize,
    valid: usize,
    invalid: usize,
}

impl BatchRunState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in the shared handle.
    #[must_use]
    pub fn shared() -> SharedRunState {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Start a new batch. Resets counters and sort memory, and invalidates
    /// every earlier generation.
    pub fn begin_batch(&mut self, tasks: Vec<CredentialTask>) -> u64 {
        self.generation += 1;
        self.tasks = tasks
            .into_iter()
            .enumerate()
            .map(|(i, mut task)| {
                task.index = i;
                task
            })
            .collect();
        self.order = (0..self.tasks.len()).collect();
        self.sort = None;
        self.completed = 0;
        self.valid = 0;
        self.invalid = 0;
        tracing::debug!(
            generation = self.generation,
            total = self.tasks.len(),
            "Batch started"
        );
        self.generation
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Mark a task as checking. Returns `false` for stale generations or
    /// unknown indices.
    pub fn mark_checking(&mut self, generation: u64, index: usize) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.tasks
            .get_mut(index)
            .is_some_and(CredentialTask::mark_checking)
    }

    /// Fold a verification result into its task and bump counters. Returns
    /// `false` and changes nothing for stale generations.
    pub fn record_completion(
        &mut self,
        generation: u64,
        index: usize,
        result: VerificationResult,
    ) -> bool {
        if !self.is_current(generation) {
            tracing::debug!(generation, index, "Discarding stale completion");
            return false;
        }
        let Some(task) = self.tasks.get_mut(index) else {
            tracing::warn!(generation, index, "Completion for unknown task");
            return false;
        };
        let success = result.success;
        if !task.mark_finished(result) {
            return false;
        }
        self.completed += 1;
        if success {
            self.valid += 1;
        } else {
            self.invalid += 1;
        }
        true
    }

    /// Sort by `column`. The same column toggles direction; a new column
    /// starts descending.
    pub fn sort(&mut self, column: SortColumn) {
        let direction = match self.sort {
            Some(current) if current.column == column => current.direction.toggled(),
            _ => SortDirection::Descending,
        };
        self.sort_by(column, direction);
    }

    /// Sort by `column` in an explicit direction.
    pub fn sort_by(&mut self, column: SortColumn, direction: SortDirection) {
        self.sort = Some(SortState { column, direction });
        self.apply_sort();
    }

    /// Re-apply the current sort without toggling.
    pub fn refresh(&mut self) {
        self.apply_sort();
    }

    fn apply_sort(&mut self) {
        let Some(sort) = self.sort else {
            return;
        };
        let tasks = &self.tasks;
        self.order
            .sort_by(|&a, &b| compare(&tasks[a], &tasks[b], sort));
    }

    #[must_use]
    pub const fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Tasks in display order.
    pub fn tasks_in_display_order(&self) -> impl Iterator<Item = &CredentialTask> {
        self.order.iter().map(|&i| &self.tasks[i])
    }

    /// Tasks in input order.
    #[must_use]
    pub fn tasks_in_index_order(&self) -> &[CredentialTask] {
        &self.tasks
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        let count = |status: TaskStatus| self.tasks.iter().filter(|t| t.status == status).count();
        Tally {
            total: self.tasks.len(),
            completed: self.completed,
            valid: self.valid,
            invalid: self.invalid,
            checking: count(TaskStatus::Checking),
            pending: count(TaskStatus::Pending),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed == self.tasks.len()
    }
}
