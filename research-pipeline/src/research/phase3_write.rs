//! Stage 3: Synthesize the report from the search results

use crate::backend::{Backend, BackendError, RoleConfig};
use crate::progress::ProgressTracker;
use crate::research::types::{PipelineStage, ReportRecord};
use crate::workflow_utils::{stream_structured, HeartbeatMonitor};

/// Input handed to the writer role
pub fn writer_input(query: &str, search_results: &[String]) -> String {
    format!("Original query: {query}\nSummarized search results: {search_results:?}")
}

/// Stream the writer role, surfacing heartbeat messages while it works
///
/// The `writing` item is marked done once the stream ends, however many
/// heartbeat messages were shown.
pub async fn write_report(
    backend: &dyn Backend,
    role: &RoleConfig,
    query: &str,
    search_results: &[String],
    mut heartbeat: HeartbeatMonitor,
    tracker: &ProgressTracker,
) -> Result<ReportRecord, BackendError> {
    let item = PipelineStage::Synthesizing.item_id();
    tracker.upsert(item, "Thinking about report...", false, false);

    let report: ReportRecord = stream_structured(
        backend,
        role,
        &writer_input(query, search_results),
        &mut heartbeat,
        |message| tracker.upsert(item, message, false, false),
    )
    .await?;

    tracker.mark_done(item);
    Ok(report)
}
