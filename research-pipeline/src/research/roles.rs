//! Backend roles used by the research pipeline

use chrono::Local;

use crate::backend::{OutputKind, RoleConfig};
use crate::research::workflow::WorkflowConfig;

const SEARCH_INSTRUCTIONS: &str = "You are a research assistant. Given a search term, you search \
the web for that term and produce a concise summary of the results. The summary must be 2-3 \
paragraphs and less than 300 words. Capture the main points. Write succinctly, no need to have \
complete sentences or good grammar. This will be consumed by someone synthesizing a report, so \
it's vital you capture the essence and ignore any fluff. Do not include any additional \
commentary other than the summary itself.";

const WRITER_INSTRUCTIONS: &str = "You are a senior researcher tasked with writing a cohesive \
report for a research query. You will be provided with the original query and some initial \
research done by a research assistant.\n\
You should first come up with an outline for the report that describes the structure and flow \
of the report. Then, generate the report and return that as your final output.\n\
The final output should be in markdown format, and it should be lengthy and detailed. Aim for \
5-10 pages of content, at least 1000 words.\n\
Respond with a JSON object with the fields \"short_summary\" (a short 2-3 sentence summary of \
the findings), \"markdown_report\" (the final report) and \"follow_up_questions\" (an array of \
suggested topics to research further).";

const FORMAT_INSTRUCTIONS: &str = "You are a presentation assistant. You are given a report and \
you need to format it into a PDF file. Respond with a JSON object with a single field \"path\" \
holding the location of the generated file.";

/// The four roles a run talks to
#[derive(Debug, Clone, PartialEq)]
pub struct Roles {
    pub planner: RoleConfig,
    pub search: RoleConfig,
    pub writer: RoleConfig,
    pub format: RoleConfig,
}

impl Roles {
    /// Build role configurations for a run. The planner prompt carries
    /// today's date so searches target current information.
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            planner: planner_role(&config.models.planner, config.max_searches),
            search: RoleConfig::new(
                "SearchAgent",
                SEARCH_INSTRUCTIONS,
                &config.models.search,
                OutputKind::Text,
            ),
            writer: RoleConfig::new(
                "WriterAgent",
                WRITER_INSTRUCTIONS,
                &config.models.writer,
                OutputKind::Json,
            ),
            format: RoleConfig::new(
                "FormatAgent",
                FORMAT_INSTRUCTIONS,
                &config.models.format,
                OutputKind::Json,
            ),
        }
    }
}

fn planner_role(model: &str, max_searches: usize) -> RoleConfig {
    let instructions = format!(
        "You are a helpful research assistant. Given a query, come up with a set of web searches \
to perform to best answer the query. Output at most {} terms to query for. \
Search up to date information. Current date is {}.\n\
Respond with a JSON object {{\"searches\": [{{\"query\": ..., \"reason\": ...}}]}} where \
\"query\" is the search term and \"reason\" explains why the search is important to the query.",
        max_searches,
        Local::now().format("%Y-%m-%d")
    );
    RoleConfig::new("PlannerAgent", instructions, model, OutputKind::Json)
}
