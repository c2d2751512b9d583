//! Concurrent fan-out with failure isolation

use futures::{stream::FuturesUnordered, Future, StreamExt};
use std::fmt::Display;
use tokio::sync::Semaphore;
use tracing::warn;

/// Context provided to each task in a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskContext {
    /// Task number (1-indexed, submission order)
    pub task_number: usize,
    /// Total number of tasks in this pool
    pub total_tasks: usize,
}

/// Result of one sub-task. Failures stay inside the pool as values; they are
/// never raised across the concurrency boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    Success(T),
    Failure(String),
}

impl<T> TaskOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T, E: Display> From<Result<T, E>> for TaskOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::Failure(e.to_string()),
        }
    }
}

/// What a pool run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport<R> {
    /// Successful outputs in completion order (not input order)
    pub results: Vec<R>,
    /// Tasks that finished, successfully or not. Always the input length.
    pub attempted: usize,
    pub succeeded: usize,
}

impl<R> PoolReport<R> {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Run one task per item concurrently and drain them as they finish
///
/// # Arguments
/// - `items`: Items to process, one task each
/// - `max_concurrency`: `None` puts every task in flight at once; `Some(n)`
///   gates tasks behind a semaphore with `n` permits (0 is treated as 1)
/// - `task_executor`: Produces the outcome for one item
/// - `on_progress`: Called with `(completed, total)` after every task finishes
///
/// # Returns
/// A [`PoolReport`] once every task has finished. A failed task is logged and
/// contributes nothing to `results`; it never cancels its siblings, and an
/// all-failed pool is still a normal return.
///
/// # Example
/// ```rust,ignore
/// let report = execute_pool(
///     plan.searches.clone(),
///     None,
///     |directive, ctx| search(backend, role, directive, ctx),
///     |done, total| println!("{done}/{total}"),
/// ).await;
/// ```
pub async fn execute_pool<T, R, F, Fut, P>(
    items: Vec<T>,
    max_concurrency: Option<usize>,
    task_executor: F,
    mut on_progress: P,
) -> PoolReport<R>
where
    F: Fn(T, TaskContext) -> Fut,
    Fut: Future<Output = TaskOutcome<R>>,
    P: FnMut(usize, usize),
{
    let total = items.len();
    let sem = max_concurrency.map(|limit| Semaphore::new(limit.max(1)));
    let executor = &task_executor;
    let mut tasks = FuturesUnordered::new();

    for (idx, item) in items.into_iter().enumerate() {
        let sem = sem.as_ref();
        let ctx = TaskContext {
            task_number: idx + 1,
            total_tasks: total,
        };

        tasks.push(async move {
            // Acquire permit when capped (waits while `limit` tasks are running)
            let _permit = match sem {
                Some(sem) => match sem.acquire().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        return (ctx, TaskOutcome::Failure("concurrency limiter closed".into()))
                    }
                },
                None => None,
            };

            (ctx, executor(item, ctx).await)
        });
    }

    // Drain in completion order; failures are dropped, never propagated
    let mut results = Vec::with_capacity(total);
    let mut completed = 0;
    while let Some((ctx, outcome)) = tasks.next().await {
        completed += 1;
        match outcome {
            TaskOutcome::Success(value) => results.push(value),
            TaskOutcome::Failure(reason) => {
                warn!(
                    task = ctx.task_number,
                    total = ctx.total_tasks,
                    %reason,
                    "sub-task failed, dropping its result"
                );
            }
        }
        on_progress(completed, total);
    }

    PoolReport {
        succeeded: results.len(),
        attempted: completed,
        results,
    }
}
