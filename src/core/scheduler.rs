//! Concurrency-bounded task scheduler.
//!
//! A fixed pool of `N` worker futures drains a shared FIFO queue. Workers are
//! joined on the calling task, so at most `N` dispatches are in flight and the
//! only suspension point in a worker is the dispatch await.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use futures::future::join_all;

use super::models::VerificationResult;
use super::provider::Provider;

/// Worker count used when the requested value is unusable.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Normalize a raw concurrency value.
///
/// Non-numeric, non-finite or non-positive input yields
/// [`DEFAULT_CONCURRENCY`]; anything else is floored with a minimum of 1.
#[must_use]
pub fn normalize_concurrency(raw: &str) -> usize {
    raw.trim()
        .parse::<f64>()
        .map_or(DEFAULT_CONCURRENCY, normalize_concurrency_value)
}

/// Numeric form of [`normalize_concurrency`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize_concurrency_value(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return DEFAULT_CONCURRENCY;
    }
    (value.floor() as usize).max(1)
}

// =============================================================================
// Queue Items & Sink
// =============================================================================

/// A unit of work handed to the dispatch function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTask {
    pub index: usize,
    pub provider: Option<Provider>,
    pub credential: String,
}

/// Receives task lifecycle events from workers.
///
/// Returning `false` from either callback tells the worker its batch is
/// stale; the worker stops pulling new tasks.
pub trait TaskSink: Send + Sync {
    fn task_started(&self, index: usize) -> bool;

    fn task_completed(&self, index: usize, result: VerificationResult) -> bool;

    /// Checked before each pop.
    fn is_stale(&self) -> bool {
        false
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Runs queued tasks with a fixed number of workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    concurrency: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl Scheduler {
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Drain `tasks` through `dispatch`, reporting to `sink`.
    ///
    /// Resolves once every worker has ended. Returns the number of tasks
    /// whose completion was accepted by the sink.
    pub async fn run<D, F, S>(&self, tasks: Vec<QueuedTask>, dispatch: D, sink: &S) -> usize
    where
        D: Fn(QueuedTask) -> F,
        F: Future<Output = VerificationResult>,
        S: TaskSink + ?Sized,
    {
        let total = tasks.len();
        // never more workers than tasks
        let worker_count = self.concurrency.min(total);
        let queue = Mutex::new(VecDeque::from(tasks));
        let started = Instant::now();
        tracing::debug!(total, workers = worker_count, "Scheduler starting");

        let workers = (0..worker_count).map(|worker| worker_loop(worker, &queue, &dispatch, sink));
        let completed: usize = join_all(workers).await.into_iter().sum();

        tracing::debug!(
            total,
            completed,
            duration_ms = started.elapsed().as_millis() as u64,
            "Scheduler finished"
        );
        completed
    }
}

fn pop_next(queue: &Mutex<VecDeque<QueuedTask>>) -> Option<QueuedTask> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

async fn worker_loop<D, F, S>(
    worker: usize,
    queue: &Mutex<VecDeque<QueuedTask>>,
    dispatch: &D,
    sink: &S,
) -> usize
where
    D: Fn(QueuedTask) -> F,
    F: Future<Output = VerificationResult>,
    S: TaskSink + ?Sized,
{
    let mut completed = 0;
    loop {
        if sink.is_stale() {
            tracing::debug!(worker, "Batch is stale, worker stopping");
            break;
        }
        let Some(task) = pop_next(queue) else {
            break;
        };
        let index = task.index;
        if !sink.task_started(index) {
            break;
        }

        let result = match AssertUnwindSafe(async { dispatch(task).await })
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(worker, index, "Verifier panicked");
                VerificationResult::fail("internal error: verifier panicked")
            }
        };

        if !sink.task_completed(index, result) {
            break;
        }
        completed += 1;
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn concurrency_normalization() {
        assert_eq!(normalize_concurrency("3"), 3);
        assert_eq!(normalize_concurrency("2.9"), 2);
        assert_eq!(normalize_concurrency("0.5"), 1);
        assert_eq!(normalize_concurrency("0"), DEFAULT_CONCURRENCY);
        assert_eq!(normalize_concurrency("-4"), DEFAULT_CONCURRENCY);
        assert_eq!(normalize_concurrency("abc"), DEFAULT_CONCURRENCY);
        assert_eq!(normalize_concurrency("NaN"), DEFAULT_CONCURRENCY);
        assert_eq!(normalize_concurrency("inf"), DEFAULT_CONCURRENCY);
        assert_eq!(normalize_concurrency(""), DEFAULT_CONCURRENCY);
    }

    #[derive(Default)]
    struct Counting {
        started: AtomicUsize,
        completed: Mutex<Vec<(usize, bool)>>,
    }

    impl TaskSink for Counting {
        fn task_started(&self, _index: usize) -> bool {
            self.started.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn task_completed(&self, index: usize, result: VerificationResult) -> bool {
            self.completed.lock().unwrap().push((index, result.success));
            true
        }
    }

    fn tasks(n: usize) -> Vec<QueuedTask> {
        (0..n)
            .map(|index| QueuedTask {
                index,
                provider: Some(Provider::OpenAI),
                credential: format!("key-{index}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn every_task_completes_once() {
        let sink = Counting::default();
        let done = Scheduler::new(3)
            .run(tasks(10), |t| async move { VerificationResult::ok(t.credential) }, &sink)
            .await;
        assert_eq!(done, 10);
        assert_eq!(sink.started.load(Ordering::SeqCst), 10);
        let mut indices: Vec<_> = sink.completed.lock().unwrap().iter().map(|c| c.0).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn panicking_dispatch_becomes_invalid() {
        let sink = Counting::default();
        Scheduler::new(2)
            .run(
                tasks(3),
                |t| async move {
                    assert!(t.index != 1, "boom");
                    VerificationResult::ok("fine")
                },
                &sink,
            )
            .await;
        let completed = sink.completed.lock().unwrap().clone();
        assert_eq!(completed.len(), 3);
        assert!(completed.contains(&(1, false)));
        assert!(completed.contains(&(0, true)));
    }

    #[tokio::test]
    async fn huge_concurrency_spawns_only_needed_workers() {
        let sink = Counting::default();
        let scheduler = Scheduler::new(normalize_concurrency("1e30"));
        assert_eq!(scheduler.concurrency(), usize::MAX);
        let done = scheduler
            .run(tasks(2), |t| async move { VerificationResult::ok(t.credential) }, &sink)
            .await;
        assert_eq!(done, 2);
    }

    #[tokio::test]
    async fn empty_queue_resolves() {
        let sink = Counting::default();
        let done = Scheduler::new(4)
            .run(Vec::new(), |_| async { VerificationResult::ok("") }, &sink)
            .await;
        assert_eq!(done, 0);
    }
}
