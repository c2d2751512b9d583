//! Pipeline orchestration for the research agent
//!
//! This module sequences the four stages of a run and threads a single
//! [`ProgressTracker`] through them:
//!
//! - **Planning**: one planner call turns the query into a [`SearchPlan`](crate::research::SearchPlan)
//! - **Searching**: every directive runs concurrently; failures are dropped
//! - **Synthesizing**: a streamed writer call, tracked by heartbeat messages
//! - **Formatting**: one formatter call produces the artifact location
//!
//! Stages never overlap: synthesis starts only after every search has
//! finished. A failure in any stage other than Searching ends the run; it is
//! reported through the tracker before the error reaches the caller.
//!
//! The primary entry point is [`ResearchPipeline::run`].

use std::sync::Arc;
use std::time::Duration;

use research_pipeline_sdk::PipelineLog;
use tracing::{error, info};
use uuid::Uuid;

use crate::backend::{Backend, BackendError};
use crate::progress::{ProgressRenderer, ProgressTracker};
use crate::research::{
    error::PipelineError,
    phase1_plan::plan_searches,
    phase2_search::perform_searches,
    phase3_write::write_report,
    phase4_format::format_report,
    roles::Roles,
    types::{PipelineStage, ResearchOutput},
};
use crate::workflow_utils::{HeartbeatMonitor, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_MESSAGES};

/// Models used for each backend role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleModels {
    pub planner: String,
    pub search: String,
    pub writer: String,
    pub format: String,
}

impl RoleModels {
    /// Same model for every role
    pub fn uniform(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            planner: model.clone(),
            search: model.clone(),
            writer: model.clone(),
            format: model,
        }
    }
}

impl Default for RoleModels {
    fn default() -> Self {
        Self {
            planner: "gpt-4o".to_string(),
            search: "gpt-4o".to_string(),
            writer: "o3-mini".to_string(),
            format: "o4-mini".to_string(),
        }
    }
}

/// Configuration for research runs
///
/// # Examples
///
/// ```
/// use research_pipeline::research::WorkflowConfig;
/// use std::time::Duration;
///
/// let config = WorkflowConfig {
///     max_concurrency: Some(4),
///     heartbeat_interval: Duration::from_secs(2),
///     ..Default::default()
/// };
/// assert_eq!(config.max_searches, 5);
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Upper bound on searches the planner is asked for
    pub max_searches: usize,
    /// Cap on searches in flight; `None` runs them all at once
    pub max_concurrency: Option<usize>,
    /// Minimum time between two heartbeat messages while writing
    pub heartbeat_interval: Duration,
    /// Heartbeat messages, shown in order, at most once each
    pub heartbeat_messages: Vec<String>,
    pub models: RoleModels,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_searches: 5,
            max_concurrency: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_messages: DEFAULT_HEARTBEAT_MESSAGES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            models: RoleModels::default(),
        }
    }
}

/// Drives research runs against a backend
pub struct ResearchPipeline {
    backend: Arc<dyn Backend>,
    config: WorkflowConfig,
    renderer: Arc<dyn ProgressRenderer>,
}

impl ResearchPipeline {
    pub fn new(
        backend: Arc<dyn Backend>,
        config: WorkflowConfig,
        renderer: Arc<dyn ProgressRenderer>,
    ) -> Self {
        Self {
            backend,
            config,
            renderer,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run the full pipeline for `query` with a fresh tracker
    pub async fn run(&self, query: &str) -> Result<ResearchOutput, PipelineError> {
        let tracker = ProgressTracker::new(self.renderer.clone());
        self.run_with_tracker(query, &tracker).await
    }

    /// Run the full pipeline for `query`, reporting into `tracker`
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Stage`] if planning, synthesis or formatting
    /// fails. Search failures are never errors.
    pub async fn run_with_tracker(
        &self,
        query: &str,
        tracker: &ProgressTracker,
    ) -> Result<ResearchOutput, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let roles = Roles::from_config(&self.config);
        let backend = self.backend.as_ref();

        info!(%run_id, query, "starting research run");
        tracker.record(PipelineLog::RunStarted {
            run_id: run_id.clone(),
            query: query.to_string(),
        });
        tracker.upsert("trace_id", format!("Run id: {run_id}"), true, true);
        tracker.upsert("starting", "Starting research...", true, true);

        // Planning
        let mut stage = PipelineStage::Planning;
        enter_stage(tracker, stage);
        let plan = match plan_searches(backend, &roles.planner, query, tracker).await {
            Ok(plan) => plan,
            Err(e) => return Err(fail_stage(tracker, stage, e)),
        };
        stage = leave_stage(tracker, stage);

        // Searching
        enter_stage(tracker, stage);
        let searches = perform_searches(
            backend,
            &roles.search,
            &plan,
            self.config.max_concurrency,
            tracker,
        )
        .await;
        info!(
            attempted = searches.attempted,
            succeeded = searches.succeeded,
            "searches drained"
        );
        stage = leave_stage(tracker, stage);

        // Synthesizing
        enter_stage(tracker, stage);
        let heartbeat = HeartbeatMonitor::new(
            self.config.heartbeat_messages.clone(),
            self.config.heartbeat_interval,
        );
        let report = match write_report(
            backend,
            &roles.writer,
            query,
            &searches.results,
            heartbeat,
            tracker,
        )
        .await
        {
            Ok(report) => report,
            Err(e) => return Err(fail_stage(tracker, stage, e)),
        };
        tracker.upsert(
            "final_report",
            format!("Report summary\n\n{}", report.short_summary),
            true,
            false,
        );
        stage = leave_stage(tracker, stage);

        // Formatting
        enter_stage(tracker, stage);
        let artifact =
            match format_report(backend, &roles.format, &report.markdown_report, tracker).await {
                Ok(artifact) => artifact,
                Err(e) => return Err(fail_stage(tracker, stage, e)),
            };
        tracker.upsert(
            "pdf_report",
            format!("PDF Report generated at: {}", artifact.path),
            true,
            false,
        );
        stage = leave_stage(tracker, stage);
        debug_assert_eq!(stage, PipelineStage::Done);

        tracker.record(PipelineLog::RunCompleted {
            run_id: run_id.clone(),
            artifact: artifact.path.clone(),
        });
        tracker.finalize();
        info!(%run_id, artifact = %artifact.path, "research run complete");

        Ok(ResearchOutput {
            run_id,
            report,
            artifact,
            searches_attempted: searches.attempted,
            searches_succeeded: searches.succeeded,
        })
    }
}

fn enter_stage(tracker: &ProgressTracker, stage: PipelineStage) {
    info!(stage = %stage, "stage started");
    tracker.record(PipelineLog::StageStarted {
        stage: stage.item_id().to_string(),
        index: stage.index(),
        total_stages: PipelineStage::COUNT,
    });
}

fn leave_stage(tracker: &ProgressTracker, stage: PipelineStage) -> PipelineStage {
    tracker.record(PipelineLog::StageCompleted {
        stage: stage.item_id().to_string(),
    });
    stage.next()
}

/// Label shown on a stage's item when the stage ends the run
fn failure_label(stage: PipelineStage) -> Option<&'static str> {
    match stage {
        PipelineStage::Planning => Some("Failed to plan searches"),
        PipelineStage::Synthesizing => Some("Failed to write report"),
        // Formatting reports its own failure before returning
        _ => None,
    }
}

/// Report a fatal stage failure and turn it into the run's error
fn fail_stage(tracker: &ProgressTracker, stage: PipelineStage, source: BackendError) -> PipelineError {
    error!(stage = %stage, error = %source, "stage failed, aborting run");
    if let Some(label) = failure_label(stage) {
        tracker.upsert(stage.item_id(), label, true, false);
    }
    tracker.record(PipelineLog::StageFailed {
        stage: stage.item_id().to_string(),
        error: source.to_string(),
    });
    tracker.finalize();
    PipelineError::stage(stage, source)
}
