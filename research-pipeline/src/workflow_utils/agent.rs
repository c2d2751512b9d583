//! Backend calls with output decoding and stream driving

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{Backend, BackendError, RoleConfig, StreamEvent};
use crate::workflow_utils::heartbeat::HeartbeatMonitor;

/// Decode a role's raw output into its record type
///
/// A payload that does not match the expected shape is a
/// [`BackendError::Decode`], never a silently defaulted record.
pub fn decode_output<T: DeserializeOwned>(
    role: &RoleConfig,
    value: serde_json::Value,
) -> Result<T, BackendError> {
    serde_json::from_value(value)
        .map_err(|e| BackendError::decode(format!("{} output: {}", role.name, e)))
}

/// Flatten a free-text output into a string
///
/// Text roles answer with a JSON string; anything else is kept as its JSON
/// rendering rather than dropped.
pub fn text_output(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Single-shot call decoded into `T`
pub async fn invoke_structured<T: DeserializeOwned>(
    backend: &dyn Backend,
    role: &RoleConfig,
    input: &str,
) -> Result<T, BackendError> {
    debug!(role = %role.name, input_len = input.len(), "invoking backend");
    let value = backend.invoke(role, input).await?;
    decode_output(role, value)
}

/// Streaming call decoded into `T`, driving `monitor` with every event
///
/// `on_heartbeat` receives each message the monitor lets through. The events
/// themselves are otherwise discarded; the result is the stream's final
/// [`StreamEvent::Completed`] payload.
pub async fn stream_structured<T, F>(
    backend: &dyn Backend,
    role: &RoleConfig,
    input: &str,
    monitor: &mut HeartbeatMonitor,
    mut on_heartbeat: F,
) -> Result<T, BackendError>
where
    T: DeserializeOwned,
    F: FnMut(&str),
{
    debug!(role = %role.name, input_len = input.len(), "invoking backend (streaming)");
    let mut stream = backend.invoke_streaming(role, input).await?;

    let mut output = None;
    let mut event_count = 0usize;
    while let Some(event) = stream.next().await {
        event_count += 1;
        if let StreamEvent::Completed(value) = event? {
            output = Some(value);
        }
        if let Some(message) = monitor.observe() {
            debug!(role = %role.name, message, "heartbeat");
            on_heartbeat(message);
        }
    }

    debug!(
        role = %role.name,
        events = event_count,
        heartbeats = monitor.emitted(),
        "stream finished"
    );

    let value = output.ok_or_else(|| {
        BackendError::stream(format!("{} stream ended without a final output", role.name))
    })?;
    decode_output(role, value)
}
