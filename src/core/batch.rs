//! Batch orchestration.
//!
//! Turns raw input into tasks, runs them through the scheduler against the
//! provider registry, and keeps the shared [`BatchRunState`] current.
//! Progress is published as [`BatchEvent`]s on an optional channel.

use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use super::aggregator::{BatchRunState, SharedRunState, Tally};
use super::classifier::Classifier;
use super::logging::{self, Redacted};
use super::models::{CredentialTask, VerificationResult};
use super::provider::ProviderFilter;
use super::scheduler::{QueuedTask, Scheduler, TaskSink};
use super::tidy;
use super::verifier::{ProviderRegistry, VerifyContext};
use crate::error::{KeyprobeError, Result};

// =============================================================================
// Events
// =============================================================================

/// Progress notification for a running batch.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A worker picked up a task.
    Started { generation: u64, index: usize },
    /// A task finished; carries the updated record and counters.
    Completed {
        generation: u64,
        task: Box<CredentialTask>,
        tally: Tally,
    },
}

// =============================================================================
// Options & Outcome
// =============================================================================

/// Options for a single batch run.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub filter: ProviderFilter,
    pub concurrency: usize,
    /// Extract credentials with the provider patterns before splitting.
    pub tidy: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            filter: ProviderFilter::Auto,
            concurrency: super::scheduler::DEFAULT_CONCURRENCY,
            tidy: false,
        }
    }
}

/// Summary returned when a batch run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub generation: u64,
    pub tally: Tally,
    /// `false` if a newer batch superseded this one while it ran.
    pub current: bool,
}

/// Split raw input into task values.
///
/// Without tidying, every non-empty trimmed line becomes one value and
/// repeats are kept.
#[must_use]
pub fn split_input(text: &str, options: &BatchOptions) -> Vec<String> {
    if options.tidy {
        tidy::tidy(text, options.filter)
    } else {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

// =============================================================================
// Sink
// =============================================================================

struct BatchSink {
    state: SharedRunState,
    generation: u64,
    events: Option<UnboundedSender<BatchEvent>>,
}

impl BatchSink {
    fn lock(&self) -> MutexGuard<'_, BatchRunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            // receiver may be gone if the caller stopped listening
            let _ = tx.send(event);
        }
    }
}

impl TaskSink for BatchSink {
    fn task_started(&self, index: usize) -> bool {
        let accepted = self.lock().mark_checking(self.generation, index);
        if accepted {
            self.emit(BatchEvent::Started {
                generation: self.generation,
                index,
            });
        }
        accepted
    }

    fn task_completed(&self, index: usize, result: VerificationResult) -> bool {
        let snapshot = {
            let mut state = self.lock();
            if !state.record_completion(self.generation, index, result) {
                return false;
            }
            state.refresh();
            state
                .tasks_in_index_order()
                .get(index)
                .cloned()
                .map(|task| (task, state.tally()))
        };
        if let Some((task, tally)) = snapshot {
            tracing::info!(
                generation = self.generation,
                index,
                provider = task.provider.map(|p| p.cli_name()),
                status = %task.status,
                "Task finished"
            );
            self.emit(BatchEvent::Completed {
                generation: self.generation,
                task: Box::new(task),
                tally,
            });
        }
        true
    }

    fn is_stale(&self) -> bool {
        !self.lock().is_current(self.generation)
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Runs batches against a provider registry.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    registry: Arc<ProviderRegistry>,
    ctx: Arc<VerifyContext>,
    classifier: Classifier,
    state: SharedRunState,
}

impl BatchRunner {
    #[must_use]
    pub fn new(registry: ProviderRegistry, ctx: VerifyContext, classifier: Classifier) -> Self {
        Self {
            registry: Arc::new(registry),
            ctx: Arc::new(ctx),
            classifier,
            state: BatchRunState::shared(),
        }
    }

    /// Shared run state, for sorting and rendering.
    #[must_use]
    pub fn state(&self) -> SharedRunState {
        Arc::clone(&self.state)
    }

    /// Build classified tasks for `values`.
    #[must_use]
    pub fn build_tasks(&self, values: Vec<String>, filter: ProviderFilter) -> Vec<CredentialTask> {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let provider = self.classifier.classify(&value, filter);
                CredentialTask::new(index, value, provider)
            })
            .collect()
    }

    /// Parse `text` and run the resulting batch.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` when the text holds no candidate values.
    pub async fn run_text(
        &self,
        text: &str,
        options: BatchOptions,
        events: Option<UnboundedSender<BatchEvent>>,
    ) -> Result<BatchOutcome> {
        self.run(split_input(text, &options), options, events).await
    }

    /// Run one batch over `values`. Starting a run invalidates any batch
    /// still in progress on this runner.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` when `values` is empty.
    pub async fn run(
        &self,
        values: Vec<String>,
        options: BatchOptions,
        events: Option<UnboundedSender<BatchEvent>>,
    ) -> Result<BatchOutcome> {
        if values.is_empty() {
            return Err(KeyprobeError::EmptyInput);
        }

        let tasks = self.build_tasks(values, options.filter);
        let total = tasks.len();
        let queued: Vec<QueuedTask> = tasks
            .iter()
            .map(|t| QueuedTask {
                index: t.index,
                provider: t.provider,
                credential: t.raw_value.clone(),
            })
            .collect();

        let generation = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .begin_batch(tasks);
        let sink = BatchSink {
            state: self.state(),
            generation,
            events,
        };

        let registry = &self.registry;
        let ctx = &self.ctx;
        let scheduler = Scheduler::new(options.concurrency);
        scheduler
            .run(
                queued,
                |task| async move {
                    let started = Instant::now();
                    let result = registry.dispatch(task.provider, &task.credential, ctx).await;
                    tracing::debug!(
                        index = task.index,
                        provider = task.provider.map(|p| p.cli_name()),
                        credential = %Redacted(&task.credential),
                        success = result.success,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "Verification finished"
                    );
                    result
                },
                &sink,
            )
            .instrument(logging::batch_span(generation, total, options.concurrency))
            .await;

        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(BatchOutcome {
            generation,
            tally: state.tally(),
            current: state.is_current(generation),
        })
    }
}
