//! Rate-limited progress messages for long streaming calls
//!
//! A streaming backend call produces an unknown number of events over an
//! unknown span of time. [`HeartbeatMonitor`] turns that into a short, ordered
//! series of human-readable phase labels: at most one per interval, and never
//! more than the queue holds.

use std::time::Duration;
use tokio::time::Instant;

/// Minimum quiet time between two heartbeat messages
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Phase labels shown while a report is being written
pub const DEFAULT_HEARTBEAT_MESSAGES: [&str; 7] = [
    "Thinking about report...",
    "Planning report structure...",
    "Writing outline...",
    "Creating sections...",
    "Cleaning up formatting...",
    "Finalizing report...",
    "Finishing report...",
];

#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    messages: Vec<String>,
    cursor: usize,
    interval: Duration,
    last_emit: Instant,
}

impl HeartbeatMonitor {
    /// Create a monitor whose quiet period starts now.
    pub fn new(messages: Vec<String>, interval: Duration) -> Self {
        Self::starting_at(messages, interval, Instant::now())
    }

    pub fn starting_at(messages: Vec<String>, interval: Duration, start: Instant) -> Self {
        Self {
            messages,
            cursor: 0,
            interval,
            last_emit: start,
        }
    }

    /// Feed one activity event observed now.
    pub fn observe(&mut self) -> Option<&str> {
        self.observe_at(Instant::now())
    }

    /// Feed one activity event observed at `now`.
    ///
    /// Returns the next queued message when strictly more than the interval
    /// has passed since the last emission and the queue is not exhausted.
    pub fn observe_at(&mut self, now: Instant) -> Option<&str> {
        if self.is_exhausted() {
            return None;
        }
        if now.saturating_duration_since(self.last_emit) <= self.interval {
            return None;
        }

        let message = &self.messages[self.cursor];
        self.cursor += 1;
        self.last_emit = now;
        Some(message.as_str())
    }

    /// Number of messages emitted so far
    pub fn emitted(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.messages.len()
    }
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new(
            DEFAULT_HEARTBEAT_MESSAGES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            DEFAULT_HEARTBEAT_INTERVAL,
        )
    }
}
