//! Observer-facing vocabulary for research pipeline runs.
//!
//! A running pipeline reports what it is doing as a stream of [`PipelineLog`]
//! events. Each event is written to stderr as a single line prefixed with
//! [`EVENT_PREFIX`], so any process supervising the pipeline can pick them out
//! of ordinary log output with [`PipelineLog::parse_line`].

use serde::{Deserialize, Serialize};

/// Line prefix marking a structured pipeline event on stderr.
pub const EVENT_PREFIX: &str = "__RP_EVENT__:";

/// Structured events emitted while a pipeline runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineLog {
    /// A new run was started for a query
    RunStarted { run_id: String, query: String },
    /// Stage started
    StageStarted {
        stage: String,
        index: usize,
        total_stages: usize,
    },
    /// Stage completed
    StageCompleted { stage: String },
    /// Stage failed; the run ends with this error
    StageFailed { stage: String, error: String },
    /// Sub-task started inside a stage
    TaskStarted {
        stage: String,
        task_id: String,
        description: String,
        total_tasks: Option<usize>,
    },
    /// Sub-task completed
    TaskCompleted {
        task_id: String,
        result: Option<String>,
    },
    /// Sub-task failed (isolated, never fatal to the run)
    TaskFailed { task_id: String, error: String },
    /// A progress item was created or overwritten
    ItemUpdated {
        id: String,
        label: String,
        done: bool,
        hide_marker: bool,
    },
    /// Terminal rendering pass over all progress items
    ProgressFinalized { items: usize },
    /// Run finished and produced an artifact
    RunCompleted { run_id: String, artifact: String },
}

impl PipelineLog {
    /// Serialize this event into its single-line wire form
    pub fn to_line(&self) -> Option<String> {
        serde_json::to_string(self)
            .ok()
            .map(|json| format!("{}{}", EVENT_PREFIX, json))
    }

    /// Parse a line previously produced by [`PipelineLog::to_line`].
    ///
    /// Returns `None` for lines that are not pipeline events.
    pub fn parse_line(line: &str) -> Option<Self> {
        let json = line.trim_end().strip_prefix(EVENT_PREFIX)?;
        serde_json::from_str(json).ok()
    }

    /// Emit this event to stderr for observer parsing
    pub fn emit(&self) {
        if let Some(line) = self.to_line() {
            use std::io::Write;
            eprintln!("{}", line);
            // Concurrent search tasks emit interleaved; flush per line
            let _ = std::io::stderr().flush();
        }
    }
}

#[macro_export]
macro_rules! log_run_start {
    ($run_id:expr, $query:expr) => {
        $crate::PipelineLog::RunStarted {
            run_id: $run_id.to_string(),
            query: $query.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_run_complete {
    ($run_id:expr, $artifact:expr) => {
        $crate::PipelineLog::RunCompleted {
            run_id: $run_id.to_string(),
            artifact: $artifact.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $index:expr, $total:expr) => {
        $crate::PipelineLog::StageStarted {
            stage: $stage.to_string(),
            index: $index,
            total_stages: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr) => {
        $crate::PipelineLog::StageCompleted {
            stage: $stage.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_failed {
    ($stage:expr, $error:expr) => {
        $crate::PipelineLog::StageFailed {
            stage: $stage.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_start {
    ($stage:expr, $task_id:expr, $desc:expr) => {
        $crate::PipelineLog::TaskStarted {
            stage: $stage.to_string(),
            task_id: $task_id.to_string(),
            description: $desc.to_string(),
            total_tasks: None,
        }
        .emit();
    };
    ($stage:expr, $task_id:expr, $desc:expr, $total:expr) => {
        $crate::PipelineLog::TaskStarted {
            stage: $stage.to_string(),
            task_id: $task_id.to_string(),
            description: $desc.to_string(),
            total_tasks: Some($total),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_complete {
    ($task_id:expr) => {
        $crate::PipelineLog::TaskCompleted {
            task_id: $task_id.to_string(),
            result: None,
        }
        .emit();
    };
    ($task_id:expr, $result:expr) => {
        $crate::PipelineLog::TaskCompleted {
            task_id: $task_id.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_failed {
    ($task_id:expr, $error:expr) => {
        $crate::PipelineLog::TaskFailed {
            task_id: $task_id.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_item {
    ($id:expr, $label:expr, $done:expr, $hide_marker:expr) => {
        $crate::PipelineLog::ItemUpdated {
            id: $id.to_string(),
            label: $label.to_string(),
            done: $done,
            hide_marker: $hide_marker,
        }
        .emit();
    };
}

// ============================================================================
// Console Logging Macros
// ============================================================================
// Human-readable counterparts to the structured events above, used by the
// CLI when it is not driven by another process.
// ============================================================================

/// Prints a section header.
///
/// # Example
/// ```
/// use research_pipeline_sdk::log_section;
/// log_section!("Final Results");
/// ```
///
/// Outputs:
/// ```text
/// ═══ Final Results ═══
/// ```
#[macro_export]
macro_rules! log_section {
    ($title:expr) => {
        println!("\n\x1b[1;36m═══ {} ═══\x1b[0m", $title);
    };
}

/// Logs an informational message.
///
/// # Example
/// ```
/// use research_pipeline_sdk::log_info;
/// log_info!("Starting research...");
/// let n = 3;
/// log_info!("Will perform {} searches", n);
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// # Example
/// ```
/// use research_pipeline_sdk::log_warning;
/// log_warning!("No searches were planned");
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs how many items of a kind were found.
///
/// # Example
/// ```
/// use research_pipeline_sdk::log_found;
/// log_found!(2, "follow up questions");
/// ```
///
/// Outputs:
/// ```text
/// Found 2 follow up questions
/// ```
#[macro_export]
macro_rules! log_found {
    ($count:expr, $item_type:expr) => {
        println!("\x1b[36mFound {} {}\x1b[0m", $count, $item_type);
    };
}
