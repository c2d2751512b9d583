//! Stage 1: Plan the searches for a query

use tracing::{debug, info};

use crate::backend::{Backend, BackendError, RoleConfig};
use crate::progress::ProgressTracker;
use crate::research::types::{PipelineStage, SearchPlan};
use crate::workflow_utils::invoke_structured;

/// Ask the planner role for a search plan
///
/// An empty plan is accepted as-is; the search stage then has nothing to do.
pub async fn plan_searches(
    backend: &dyn Backend,
    role: &RoleConfig,
    query: &str,
    tracker: &ProgressTracker,
) -> Result<SearchPlan, BackendError> {
    let item = PipelineStage::Planning.item_id();
    tracker.upsert(item, "Planning searches...", false, false);

    let plan: SearchPlan = invoke_structured(backend, role, &format!("Query: {query}")).await?;

    info!(searches = plan.len(), "search plan ready");
    for (idx, search) in plan.searches.iter().enumerate() {
        debug!(
            search = idx + 1,
            query = %search.query,
            reason = %search.reason,
            "planned search"
        );
    }

    tracker.upsert(
        item,
        format!("Will perform {} searches", plan.len()),
        true,
        false,
    );
    Ok(plan)
}
