//! Workflow utilities shared by the pipeline stages
//!
//! - **batch**: Concurrent fan-out with completion-order draining and failure isolation
//! - **heartbeat**: Rate-limited progress messages for long streaming calls
//! - **agent**: Backend calls with output decoding and stream driving

pub mod agent;
pub mod batch;
pub mod heartbeat;

// Re-export commonly used types and functions
pub use agent::{invoke_structured, stream_structured, text_output};
pub use batch::{execute_pool, PoolReport, TaskContext, TaskOutcome};
pub use heartbeat::{HeartbeatMonitor, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_MESSAGES};
