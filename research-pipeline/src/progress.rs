//! Live progress tracking for pipeline runs.
//!
//! [`ProgressTracker`] keeps one [`ProgressItem`] per id and hands every change
//! to a [`ProgressRenderer`]. Search tasks running concurrently share a single
//! tracker, so all state lives behind a mutex that is never held across an
//! await point.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use research_pipeline_sdk::{
    log_item, log_run_complete, log_run_start, log_stage_complete, log_stage_failed,
    log_stage_start, log_task_complete, log_task_failed, log_task_start, PipelineLog,
};
use tracing::debug;

/// A named status entry shown to the observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressItem {
    pub id: String,
    pub label: String,
    pub done: bool,
    pub hide_marker: bool,
}

/// Side-effecting render hook invoked on every tracker change
pub trait ProgressRenderer: Send + Sync {
    fn render(&self, event: &PipelineLog);
}

/// Renderer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl ProgressRenderer for NoopRenderer {
    fn render(&self, _event: &PipelineLog) {}
}

/// Emits structured `__RP_EVENT__` lines on stderr for a supervising process
#[derive(Debug, Default, Clone, Copy)]
pub struct EventRenderer;

impl ProgressRenderer for EventRenderer {
    fn render(&self, event: &PipelineLog) {
        match event {
            PipelineLog::ItemUpdated {
                id,
                label,
                done,
                hide_marker,
            } => {
                log_item!(id, label, *done, *hide_marker);
            }
            PipelineLog::RunStarted { run_id, query } => {
                log_run_start!(run_id, query);
            }
            PipelineLog::RunCompleted { run_id, artifact } => {
                log_run_complete!(run_id, artifact);
            }
            PipelineLog::StageStarted {
                stage,
                index,
                total_stages,
            } => {
                log_stage_start!(stage, *index, *total_stages);
            }
            PipelineLog::StageCompleted { stage } => {
                log_stage_complete!(stage);
            }
            PipelineLog::StageFailed { stage, error } => {
                log_stage_failed!(stage, error);
            }
            PipelineLog::TaskStarted {
                stage,
                task_id,
                description,
                total_tasks: Some(total),
            } => {
                log_task_start!(stage, task_id, description, *total);
            }
            PipelineLog::TaskStarted {
                stage,
                task_id,
                description,
                total_tasks: None,
            } => {
                log_task_start!(stage, task_id, description);
            }
            PipelineLog::TaskCompleted {
                task_id,
                result: Some(result),
            } => {
                log_task_complete!(task_id, result);
            }
            PipelineLog::TaskCompleted {
                task_id,
                result: None,
            } => {
                log_task_complete!(task_id);
            }
            PipelineLog::TaskFailed { task_id, error } => {
                log_task_failed!(task_id, error);
            }
            PipelineLog::ProgressFinalized { .. } => event.emit(),
        }
    }
}

/// Human-readable status lines on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleRenderer;

impl ProgressRenderer for ConsoleRenderer {
    fn render(&self, event: &PipelineLog) {
        match event {
            PipelineLog::ItemUpdated {
                label,
                done,
                hide_marker,
                ..
            } => {
                if *hide_marker {
                    println!("  {}", label);
                } else if *done {
                    println!("\x1b[32m✓\x1b[0m {}", label);
                } else {
                    println!("\x1b[36m…\x1b[0m {}", label);
                }
            }
            PipelineLog::StageStarted {
                stage,
                index,
                total_stages,
            } => {
                println!(
                    "\x1b[1;36m═══ STAGE {}/{}: {} ═══\x1b[0m",
                    index, total_stages, stage
                );
            }
            PipelineLog::StageFailed { stage, error } => {
                println!("\x1b[31m✗ {} failed: {}\x1b[0m", stage, error);
            }
            PipelineLog::ProgressFinalized { .. } => {
                println!();
            }
            _ => {}
        }
        let _ = std::io::stdout().flush();
    }
}

#[derive(Default)]
struct TrackerState {
    items: Vec<ProgressItem>,
    index: HashMap<String, usize>,
    finalized: bool,
}

/// Map of progress items keyed by id, with a render hook
pub struct ProgressTracker {
    state: Mutex<TrackerState>,
    renderer: Arc<dyn ProgressRenderer>,
}

impl ProgressTracker {
    pub fn new(renderer: Arc<dyn ProgressRenderer>) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            renderer,
        }
    }

    /// Tracker that renders nothing
    pub fn silent() -> Self {
        Self::new(Arc::new(NoopRenderer))
    }

    // A panic in a renderer must not wedge the rest of the run
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create the item for `id`, or overwrite its label and flags in place.
    pub fn upsert(&self, id: &str, label: impl Into<String>, done: bool, hide_marker: bool) {
        let item = ProgressItem {
            id: id.to_string(),
            label: label.into(),
            done,
            hide_marker,
        };

        let mut state = self.lock();
        match state.index.get(id).copied() {
            Some(pos) => state.items[pos] = item.clone(),
            None => {
                let pos = state.items.len();
                state.index.insert(id.to_string(), pos);
                state.items.push(item.clone());
            }
        }
        self.renderer.render(&PipelineLog::ItemUpdated {
            id: item.id,
            label: item.label,
            done: item.done,
            hide_marker: item.hide_marker,
        });
    }

    /// Mark an existing item done without touching its label.
    ///
    /// Returns `false` (and changes nothing) when `id` is unknown.
    pub fn mark_done(&self, id: &str) -> bool {
        let mut state = self.lock();
        let Some(pos) = state.index.get(id).copied() else {
            debug!(id, "mark_done on unknown progress item");
            return false;
        };

        let item = &mut state.items[pos];
        item.done = true;
        self.renderer.render(&PipelineLog::ItemUpdated {
            id: item.id.clone(),
            label: item.label.clone(),
            done: true,
            hide_marker: item.hide_marker,
        });
        true
    }

    /// Terminal rendering pass. Only the first call renders.
    pub fn finalize(&self) {
        let mut state = self.lock();
        if state.finalized {
            return;
        }
        state.finalized = true;
        self.renderer.render(&PipelineLog::ProgressFinalized {
            items: state.items.len(),
        });
    }

    /// Pass a non-item event (stage or task lifecycle) to the renderer
    pub fn record(&self, event: PipelineLog) {
        // Serialize with item updates so observers see a consistent order
        let _state = self.lock();
        self.renderer.render(&event);
    }

    pub fn get(&self, id: &str) -> Option<ProgressItem> {
        let state = self.lock();
        state.index.get(id).map(|pos| state.items[*pos].clone())
    }

    /// Snapshot of all items in first-upsert order
    pub fn items(&self) -> Vec<ProgressItem> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().finalized
    }
}
