//! Stage 2: Run every planned search concurrently

use research_pipeline_sdk::PipelineLog;

use crate::backend::{Backend, RoleConfig};
use crate::progress::ProgressTracker;
use crate::research::types::{PipelineStage, SearchDirective, SearchPlan};
use crate::workflow_utils::{execute_pool, text_output, PoolReport, TaskContext, TaskOutcome};

/// Execute all searches of `plan`, draining them as they complete
///
/// Never fails: a search that errors is dropped from the results and only
/// shows up in the report's counters.
pub async fn perform_searches(
    backend: &dyn Backend,
    role: &RoleConfig,
    plan: &SearchPlan,
    max_concurrency: Option<usize>,
    tracker: &ProgressTracker,
) -> PoolReport<String> {
    let item = PipelineStage::Searching.item_id();
    tracker.upsert(item, "Searching...", false, false);

    let report = execute_pool(
        plan.searches.clone(),
        max_concurrency,
        |directive, ctx| search(backend, role, directive, ctx, tracker),
        |completed, total| {
            tracker.upsert(
                item,
                format!("Searching... {completed}/{total} completed"),
                false,
                false,
            );
        },
    )
    .await;

    tracker.mark_done(item);
    report
}

/// Run a single search directive
pub async fn search(
    backend: &dyn Backend,
    role: &RoleConfig,
    directive: SearchDirective,
    ctx: TaskContext,
    tracker: &ProgressTracker,
) -> TaskOutcome<String> {
    let task_id = format!("search_{}", ctx.task_number);
    tracker.record(PipelineLog::TaskStarted {
        stage: PipelineStage::Searching.item_id().to_string(),
        task_id: task_id.clone(),
        description: format!("Searching: {}", directive.query),
        total_tasks: Some(ctx.total_tasks),
    });

    match backend.invoke(role, &directive.to_input()).await {
        Ok(value) => {
            let text = text_output(value);
            tracker.record(PipelineLog::TaskCompleted {
                task_id,
                result: Some(format!("{} chars", text.len())),
            });
            TaskOutcome::Success(text)
        }
        Err(e) => {
            tracker.record(PipelineLog::TaskFailed {
                task_id,
                error: e.to_string(),
            });
            TaskOutcome::Failure(format!("search '{}' failed: {}", directive.query, e))
        }
    }
}
