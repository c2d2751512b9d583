//! Data structures for research pipeline runs

use serde::{Deserialize, Serialize};

/// A single web search the planner wants performed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDirective {
    /// The search term to use
    pub query: String,
    /// Why this search matters to the query
    pub reason: String,
}

impl SearchDirective {
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Input handed to the search role for this directive
    pub fn to_input(&self) -> String {
        format!(
            "Search term: {}\nReason for searching: {}",
            self.query, self.reason
        )
    }
}

/// Ordered searches produced by planning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
    pub searches: Vec<SearchDirective>,
}

impl SearchPlan {
    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }
}

/// Report written by the synthesis stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Two or three sentence summary of the findings
    pub short_summary: String,
    /// The full report in markdown
    pub markdown_report: String,
    /// Suggested topics to research further
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

/// Where the formatted report was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub path: String,
}

/// Stages of a run, strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Planning,
    Searching,
    Synthesizing,
    Formatting,
    Done,
    Failed,
}

impl PipelineStage {
    /// Number of working stages (excludes `Done` and `Failed`)
    pub const COUNT: usize = 4;

    /// Next stage; terminal stages stay where they are
    pub fn next(self) -> Self {
        match self {
            Self::Planning => Self::Searching,
            Self::Searching => Self::Synthesizing,
            Self::Synthesizing => Self::Formatting,
            Self::Formatting => Self::Done,
            Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    /// Progress item id an observer sees for this stage
    pub fn item_id(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Searching => "searching",
            Self::Synthesizing => "writing",
            Self::Formatting => "formatting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// 1-based position among the working stages
    pub fn index(self) -> usize {
        match self {
            Self::Planning => 1,
            Self::Searching => 2,
            Self::Synthesizing => 3,
            Self::Formatting => 4,
            Self::Done | Self::Failed => Self::COUNT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Searching => "Searching",
            Self::Synthesizing => "Synthesizing",
            Self::Formatting => "Formatting",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Final result of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResearchOutput {
    pub run_id: String,
    pub report: ReportRecord,
    pub artifact: ArtifactLocation,
    pub searches_attempted: usize,
    pub searches_succeeded: usize,
}
