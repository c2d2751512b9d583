//! Progress tracker idempotence and rendering

use std::collections::HashSet;
use std::sync::Arc;

use research_pipeline::progress::ProgressTracker;
use research_pipeline_sdk::PipelineLog;

use super::common::RecordingRenderer;

#[test]
fn test_entry_count_equals_distinct_ids() {
    let tracker = ProgressTracker::silent();
    let ids = ["planning", "searching", "writing", "planning", "searching", "planning"];

    for (n, id) in ids.iter().enumerate() {
        tracker.upsert(id, format!("update {n}"), n % 2 == 0, false);
    }

    let distinct: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(tracker.len(), distinct.len());

    // Last write wins, first-upsert position is kept
    let items = tracker.items();
    assert_eq!(items[0].id, "planning");
    assert_eq!(items[0].label, "update 5");
    assert_eq!(items[1].label, "update 4");
    assert!(items[1].done);
}

#[test]
fn test_repeated_identical_upserts_do_not_duplicate() {
    let tracker = ProgressTracker::silent();
    for _ in 0..100 {
        tracker.upsert("formatting", "Converting report to PDF...", false, false);
    }
    assert_eq!(tracker.len(), 1);
}

#[test]
fn test_hide_marker_is_kept() {
    let tracker = ProgressTracker::silent();
    tracker.upsert("trace_id", "Run id: 1234", true, true);

    let item = tracker.get("trace_id").unwrap();
    assert!(item.hide_marker);
    assert!(item.done);
}

#[test]
fn test_record_passes_events_through_in_order() {
    let renderer = Arc::new(RecordingRenderer::default());
    let tracker = ProgressTracker::new(renderer.clone());

    tracker.record(PipelineLog::StageStarted {
        stage: "planning".to_string(),
        index: 1,
        total_stages: 4,
    });
    tracker.upsert("planning", "Planning searches...", false, false);
    tracker.record(PipelineLog::StageCompleted {
        stage: "planning".to_string(),
    });
    tracker.finalize();

    let events = renderer.events();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], PipelineLog::StageStarted { .. }));
    assert!(matches!(events[1], PipelineLog::ItemUpdated { .. }));
    assert!(matches!(events[2], PipelineLog::StageCompleted { .. }));
    assert_eq!(events[3], PipelineLog::ProgressFinalized { items: 1 });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_tracker_across_tasks() {
    let renderer = Arc::new(RecordingRenderer::default());
    let tracker = Arc::new(ProgressTracker::new(renderer.clone()));

    let handles: Vec<_> = (1..=5)
        .map(|n| {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                tracker.upsert("searching", format!("Searching... {n}/5 completed"), false, false);
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    tracker.mark_done("searching");

    assert_eq!(tracker.len(), 1);
    assert!(tracker.get("searching").unwrap().done);
    assert_eq!(renderer.updates_for("searching").len(), 6);
}
