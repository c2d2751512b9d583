//! CLI argument parsing for the research agent

use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use crate::backend::openai::{BackendConfig, DEFAULT_BASE_URL};
use crate::research::workflow::{RoleModels, WorkflowConfig};

/// Research Agent CLI Arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "research-agent",
    about = "Plan web searches for a query, run them concurrently, and write a report"
)]
pub struct Args {
    /// Research query (prompted for on stdin when omitted)
    #[arg(short, long)]
    pub input: Option<String>,

    /// API key for the model endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "120")]
    pub timeout_secs: u64,

    /// Maximum searches in flight (default: all at once)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Minimum seconds between two heartbeat messages while writing
    #[arg(long, default_value = "5")]
    pub heartbeat_secs: u64,

    /// Maximum number of searches the planner may request
    #[arg(long, default_value = "5")]
    pub max_searches: usize,

    /// Use one model for every role instead of the per-role defaults
    #[arg(long)]
    pub model: Option<String>,

    /// Emit structured progress events on stderr instead of console lines
    #[arg(long)]
    pub events: bool,
}

impl Args {
    /// Endpoint configuration for the HTTP backend
    pub fn backend_config(&self) -> Result<BackendConfig> {
        let api_key = match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => bail!("no API key: pass --api-key or set OPENAI_API_KEY"),
        };
        Ok(BackendConfig::new(api_key)
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

impl From<&Args> for WorkflowConfig {
    fn from(args: &Args) -> Self {
        WorkflowConfig {
            max_searches: args.max_searches,
            max_concurrency: args.max_concurrency,
            heartbeat_interval: Duration::from_secs(args.heartbeat_secs),
            models: args
                .model
                .as_deref()
                .map(RoleModels::uniform)
                .unwrap_or_default(),
            ..Default::default()
        }
    }
}
