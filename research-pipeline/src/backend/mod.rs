//! Reasoning backend contract.
//!
//! Every pipeline stage talks to the backend through [`Backend`]: a one-shot
//! [`Backend::invoke`] for planning, searching and formatting, and
//! [`Backend::invoke_streaming`] for report synthesis. Outputs come back as raw
//! JSON and are decoded into stage records by the caller.

pub mod error;
pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

pub use error::BackendError;
pub use openai::{BackendConfig, OpenAiBackend};

/// Shape of the output a role is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// A JSON object matching the stage record
    Json,
    /// Free text, delivered as a JSON string value
    Text,
}

/// Configuration of one backend role (planner, searcher, writer, formatter)
#[derive(Debug, Clone, PartialEq)]
pub struct RoleConfig {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub output: OutputKind,
}

impl RoleConfig {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
        output: OutputKind,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            output,
        }
    }
}

/// One event of a streaming backend call
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Backend activity that carried no output text
    Activity,
    /// A fragment of generated text
    Delta(String),
    /// Final structured output; the last event of a well-formed stream
    Completed(serde_json::Value),
}

/// Event sequence returned by [`Backend::invoke_streaming`]
pub type BackendStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, BackendError>> + Send>>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Single-shot call returning the role's structured output.
    async fn invoke(
        &self,
        role: &RoleConfig,
        input: &str,
    ) -> Result<serde_json::Value, BackendError>;

    /// Streaming call; the stream terminates with [`StreamEvent::Completed`].
    async fn invoke_streaming(
        &self,
        role: &RoleConfig,
        input: &str,
    ) -> Result<BackendStream, BackendError>;
}
