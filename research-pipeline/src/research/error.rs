//! Pipeline error types

use thiserror::Error;

use crate::backend::BackendError;
use crate::research::types::PipelineStage;

/// A fatal stage failure. Search sub-task failures never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: BackendError,
    },
}

impl PipelineError {
    pub fn stage(stage: PipelineStage, source: BackendError) -> Self {
        Self::Stage { stage, source }
    }

    /// Stage the run failed in
    pub fn failed_stage(&self) -> PipelineStage {
        match self {
            Self::Stage { stage, .. } => *stage,
        }
    }
}
