//! OpenAI-compatible chat completions backend.

use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Backend, BackendError, BackendStream, OutputKind, RoleConfig, StreamEvent};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Endpoint and credentials for [`OpenAiBackend`]
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout. A hung call fails with this instead of stalling
    /// its search slot forever.
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Backend speaking the OpenAI `/chat/completions` protocol
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        if config.api_key.trim().is_empty() {
            return Err(BackendError::config("API key is empty"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| BackendError::config("Invalid API key format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(
        &self,
        role: &RoleConfig,
        input: &str,
        stream: bool,
    ) -> Result<reqwest::Response, BackendError> {
        let messages = [
            ApiMessage {
                role: "system",
                content: &role.instructions,
            },
            ApiMessage {
                role: "user",
                content: input,
            },
        ];

        let request = ChatApiRequest {
            model: &role.model,
            messages: &messages,
            response_format: match role.output {
                OutputKind::Json => Some(ResponseFormat {
                    format_type: "json_object",
                }),
                OutputKind::Text => None,
            },
            stream,
        };

        debug!(role = %role.name, model = %role.model, stream, "sending chat request");

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ChatApiResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.error)
            .and_then(|error| error.message)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Err(BackendError::status(status.as_u16(), message))
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatApiResponse {
    choices: Option<Vec<Choice>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

// =============================================================================
// DECODING
// =============================================================================

/// One line of a server-sent event stream
#[derive(Debug, PartialEq)]
enum SseLine {
    Delta(String),
    Activity,
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> Result<SseLine, BackendError> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: ChunkResponse = serde_json::from_str(data)
        .map_err(|e| BackendError::stream(format!("malformed stream chunk: {e}")))?;

    let text = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.and_then(|delta| delta.content))
        .collect::<String>();

    if text.is_empty() {
        Ok(SseLine::Activity)
    } else {
        Ok(SseLine::Delta(text))
    }
}

/// Strip a surrounding markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline
    let body = rest.find('\n').map(|pos| &rest[pos + 1..]).unwrap_or("");
    body.rfind("```")
        .map(|end| &body[..end])
        .unwrap_or(body)
        .trim()
}

/// Turn generated content into the role's output value
fn decode_content(content: &str, output: OutputKind) -> Result<serde_json::Value, BackendError> {
    match output {
        OutputKind::Text => Ok(serde_json::Value::String(content.trim().to_string())),
        OutputKind::Json => serde_json::from_str(strip_code_fence(content))
            .map_err(|e| BackendError::decode(format!("content is not valid JSON: {e}"))),
    }
}

// =============================================================================
// BACKEND IMPL
// =============================================================================

#[async_trait]
impl Backend for OpenAiBackend {
    async fn invoke(
        &self,
        role: &RoleConfig,
        input: &str,
    ) -> Result<serde_json::Value, BackendError> {
        let response = self.send(role, input, false).await?;
        let body = response.text().await?;

        let parsed: ChatApiResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::decode(format!("invalid response body: {e}")))?;

        let content = parsed
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| BackendError::decode("response contained no message content"))?;

        decode_content(&content, role.output)
    }

    async fn invoke_streaming(
        &self,
        role: &RoleConfig,
        input: &str,
    ) -> Result<BackendStream, BackendError> {
        let response = self.send(role, input, true).await?;
        Ok(Box::pin(sse_events(response, role.output)))
    }
}

/// Decode a server-sent event response into stream events, finishing with
/// the decoded content of the whole stream.
fn sse_events(
    response: reqwest::Response,
    output: OutputKind,
) -> impl Stream<Item = Result<StreamEvent, BackendError>> + Send {
    try_stream! {
        let mut bytes = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut content = String::new();
        let mut finished = false;

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                match parse_sse_line(&String::from_utf8_lossy(&line))? {
                    SseLine::Delta(text) => {
                        content.push_str(&text);
                        yield StreamEvent::Delta(text);
                    }
                    SseLine::Activity => yield StreamEvent::Activity,
                    SseLine::Done => finished = true,
                    SseLine::Skip => {}
                }
            }

            if finished {
                break;
            }
        }

        if !finished {
            // Tolerate a final data line without a trailing newline
            if let SseLine::Delta(text) = parse_sse_line(&String::from_utf8_lossy(&buffer))? {
                content.push_str(&text);
                yield StreamEvent::Delta(text);
            }
        }

        yield StreamEvent::Completed(decode_content(&content, output)?);
    }
}
