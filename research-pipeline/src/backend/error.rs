//! Error types for backend calls.

use thiserror::Error;

/// Errors that can occur when calling the reasoning backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP/network error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Output could not be decoded into the expected record shape.
    #[error("failed to decode backend output: {0}")]
    Decode(String),

    /// Streaming call broke off or ended without a final output.
    #[error("stream error: {0}")]
    Stream(String),

    /// Configuration error (missing API key, bad endpoint, etc.).
    #[error("configuration error: {0}")]
    Config(String),
}

impl BackendError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
            Self::Stream(_) => "stream",
            Self::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
