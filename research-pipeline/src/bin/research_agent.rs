/*
┌─────────────────────────────────────────────────────────────────────────────┐
│                         RESEARCH AGENT PIPELINE                              │
└─────────────────────────────────────────────────────────────────────────────┘

  Stage 1: PLAN
    │
    ├─> Input: research query
    ├─> Planner role proposes up to --max-searches web searches
    └─> Output: SearchPlan { searches: [{query, reason}] }

         ↓

  Stage 2: SEARCH (concurrent)
    │
    ├─> One search role call per directive, all in flight at once
    │   (or at most --max-concurrency)
    ├─> Failed searches are logged and dropped
    └─> Output: summaries in completion order

         ↓

  Stage 3: WRITE (streaming)
    │
    ├─> Input: query + search summaries
    ├─> Writer role streams its answer
    ├─> Heartbeat messages at most every --heartbeat-secs
    └─> Output: ReportRecord { short_summary, markdown_report, follow_up_questions }

         ↓

  Stage 4: FORMAT
    │
    ├─> Input: markdown report
    └─> Output: ArtifactLocation { path }

EXAMPLE COMMANDS:

  # Interactive: prompts for the query
  research-agent

  # One-shot against a local OpenAI-compatible server
  research-agent \
    --input "State of WebAssembly component model" \
    --base-url http://localhost:8080/v1 \
    --model qwen2.5-72b

  # Structured progress events for a supervising process
  research-agent --events --max-concurrency 3 -i "Rust in the Linux kernel"

*/

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use research_pipeline::backend::OpenAiBackend;
use research_pipeline::progress::{ConsoleRenderer, EventRenderer, ProgressRenderer};
use research_pipeline::research::{cli::Args, ResearchPipeline, WorkflowConfig};
use research_pipeline_sdk::{log_found, log_info, log_section, log_warning};
use tracing_subscriber::EnvFilter;

fn read_query() -> Result<String> {
    print!("What would you like to research? ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read query from stdin")?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let query = match args.input.clone() {
        Some(query) => query.trim().to_string(),
        None => read_query()?,
    };
    if query.is_empty() {
        bail!("No research query given");
    }

    let backend = OpenAiBackend::new(args.backend_config()?)
        .context("Failed to create model backend")?;
    let renderer: Arc<dyn ProgressRenderer> = if args.events {
        Arc::new(EventRenderer)
    } else {
        Arc::new(ConsoleRenderer)
    };
    let config = WorkflowConfig::from(&args);

    let pipeline = ResearchPipeline::new(Arc::new(backend), config, renderer);
    let output = pipeline
        .run(&query)
        .await
        .with_context(|| format!("Research run for {query:?} failed"))?;

    if output.searches_succeeded < output.searches_attempted {
        log_warning!(
            "{} of {} searches failed",
            output.searches_attempted - output.searches_succeeded,
            output.searches_attempted
        );
    }

    log_section!("REPORT");
    println!("{}", output.report.markdown_report);

    log_section!("FOLLOW UP QUESTIONS");
    log_found!(output.report.follow_up_questions.len(), "follow up questions");
    for question in &output.report.follow_up_questions {
        println!("  • {}", question);
    }

    log_info!("Run id: {}", output.run_id);
    log_info!("Report written to {}", output.artifact.path);

    Ok(())
}
