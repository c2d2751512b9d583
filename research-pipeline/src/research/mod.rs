//! Research pipeline
//!
//! Turns a free-text query into a written, formatted report in four stages:
//! plan searches, run them concurrently, synthesize a report while streaming
//! heartbeat updates, then format the report into an artifact.

pub mod cli;
pub mod error;
pub mod phase1_plan;
pub mod phase2_search;
pub mod phase3_write;
pub mod phase4_format;
pub mod roles;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use error::PipelineError;
pub use roles::Roles;
pub use types::{
    ArtifactLocation, PipelineStage, ReportRecord, ResearchOutput, SearchDirective, SearchPlan,
};
pub use workflow::{ResearchPipeline, RoleModels, WorkflowConfig};
