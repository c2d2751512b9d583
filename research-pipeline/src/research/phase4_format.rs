//! Stage 4: Format the report into its final artifact

use tracing::warn;

use crate::backend::{Backend, BackendError, RoleConfig};
use crate::progress::ProgressTracker;
use crate::research::types::{ArtifactLocation, PipelineStage};
use crate::workflow_utils::invoke_structured;

pub const FORMAT_FAILED_LABEL: &str = "Failed to generate PDF report";

/// Ask the format role to render the markdown report
///
/// On failure the `formatting` item is reported as done with
/// [`FORMAT_FAILED_LABEL`] before the error is returned.
pub async fn format_report(
    backend: &dyn Backend,
    role: &RoleConfig,
    markdown_report: &str,
    tracker: &ProgressTracker,
) -> Result<ArtifactLocation, BackendError> {
    let item = PipelineStage::Formatting.item_id();
    tracker.upsert(item, "Converting report to PDF...", false, false);

    match invoke_structured::<ArtifactLocation>(backend, role, markdown_report).await {
        Ok(location) => {
            tracker.mark_done(item);
            Ok(location)
        }
        Err(e) => {
            warn!(error = %e, code = e.code(), "failed to format report");
            tracker.upsert(item, FORMAT_FAILED_LABEL, true, false);
            Err(e)
        }
    }
}
