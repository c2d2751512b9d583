//! Heartbeat rate limiting

use std::time::Duration;

use research_pipeline::workflow_utils::{HeartbeatMonitor, DEFAULT_HEARTBEAT_MESSAGES};
use tokio::time::Instant;

fn queue(m: usize) -> Vec<String> {
    (0..m).map(|i| format!("message {i}")).collect()
}

/// Feed events every `step` over `span` and collect what was emitted
fn feed(m: usize, interval: Duration, span: Duration, step: Duration) -> Vec<String> {
    let start = Instant::now();
    let mut monitor = HeartbeatMonitor::starting_at(queue(m), interval, start);

    let mut emitted = Vec::new();
    let mut offset = Duration::ZERO;
    while offset <= span {
        if let Some(message) = monitor.observe_at(start + offset) {
            emitted.push(message.to_string());
        }
        offset += step;
    }
    emitted
}

#[test]
fn test_emissions_bounded_by_queue_and_elapsed_time() {
    let intervals = [1u64, 2, 5, 7];
    let spans = [0u64, 3, 10, 23, 60];
    let queues = [0usize, 1, 3, 7];

    for interval in intervals {
        for span in spans {
            for m in queues {
                let emitted = feed(
                    m,
                    Duration::from_secs(interval),
                    Duration::from_secs(span),
                    Duration::from_millis(250),
                );

                let bound = m.min((span / interval) as usize);
                assert!(
                    emitted.len() <= bound,
                    "interval {interval}s, span {span}s, queue {m}: {} > {bound}",
                    emitted.len()
                );
                // Strict queue order, no repeats
                assert_eq!(emitted, queue(emitted.len()));
            }
        }
    }
}

#[test]
fn test_sparse_events_emit_once_per_event() {
    // One event every 30s with a 5s interval: each event may emit
    let emitted = feed(
        3,
        Duration::from_secs(5),
        Duration::from_secs(120),
        Duration::from_secs(30),
    );
    assert_eq!(emitted, queue(3));
}

#[test]
fn test_no_events_no_messages() {
    let mut monitor = HeartbeatMonitor::default();
    assert_eq!(monitor.emitted(), 0);
    assert!(!monitor.is_exhausted());
    // Only an observed event can emit
    assert_eq!(monitor.observe_at(Instant::now()), None);
}

#[tokio::test(start_paused = true)]
async fn test_observe_follows_the_runtime_clock() {
    let messages: Vec<String> = DEFAULT_HEARTBEAT_MESSAGES
        .iter()
        .map(|m| m.to_string())
        .collect();
    let mut monitor = HeartbeatMonitor::new(messages, Duration::from_secs(5));

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(monitor.observe(), None);

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(monitor.observe(), Some("Thinking about report..."));

    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(monitor.observe(), None);

    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(monitor.observe(), Some("Planning report structure..."));
    assert_eq!(monitor.emitted(), 2);
}
