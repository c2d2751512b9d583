//! Task pool draining, isolation and ordering

use std::collections::BTreeSet;
use std::time::Duration;

use research_pipeline::workflow_utils::{execute_pool, TaskOutcome};

async fn run_pool(n: usize, failing: &[usize]) -> (usize, Vec<usize>) {
    let report = execute_pool(
        (0..n).collect::<Vec<_>>(),
        None,
        |item, _ctx| async move {
            if failing.contains(&item) {
                TaskOutcome::Failure(format!("task {item} failed"))
            } else {
                TaskOutcome::Success(item)
            }
        },
        |_, _| {},
    )
    .await;
    (report.attempted, report.results)
}

#[tokio::test]
async fn test_attempted_always_equals_input_size() {
    for n in 0..12 {
        let all: Vec<usize> = (0..n).collect();
        let evens: Vec<usize> = (0..n).filter(|i| i % 2 == 0).collect();

        for failing in [&[][..], &evens[..], &all[..]] {
            let (attempted, _) = run_pool(n, failing).await;
            assert_eq!(attempted, n, "n = {n}, failing = {failing:?}");
        }
    }
}

#[tokio::test]
async fn test_k_failures_leave_n_minus_k_results() {
    let n = 10;
    for k in 0..=n {
        let failing: Vec<usize> = (0..k).collect();
        let (attempted, results) = run_pool(n, &failing).await;

        assert_eq!(attempted, n);
        assert_eq!(results.len(), n - k);
        assert!(results.iter().all(|r| !failing.contains(r)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_latency_permutations_keep_the_same_result_set() {
    let latencies: [[u64; 4]; 4] = [
        [10, 20, 30, 40],
        [40, 30, 20, 10],
        [20, 40, 10, 30],
        [30, 10, 40, 20],
    ];

    let mut sets = Vec::new();
    for delays in latencies {
        let report = execute_pool(
            delays.iter().copied().enumerate().collect::<Vec<_>>(),
            None,
            |(id, delay), _ctx| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if id == 2 {
                    TaskOutcome::Failure("unlucky".to_string())
                } else {
                    TaskOutcome::Success(id)
                }
            },
            |_, _| {},
        )
        .await;

        // Results arrive fastest first
        let expected_order: Vec<usize> = {
            let mut by_latency: Vec<(u64, usize)> = delays
                .iter()
                .copied()
                .enumerate()
                .filter(|(id, _)| *id != 2)
                .map(|(id, delay)| (delay, id))
                .collect();
            by_latency.sort();
            by_latency.into_iter().map(|(_, id)| id).collect()
        };
        assert_eq!(report.results, expected_order);

        sets.push(report.results.into_iter().collect::<BTreeSet<_>>());
    }

    assert!(sets.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(sets[0], BTreeSet::from([0, 1, 3]));
}

#[tokio::test(start_paused = true)]
async fn test_capped_pool_still_drains_everything() {
    let report = execute_pool(
        (0..7).collect::<Vec<u64>>(),
        Some(3),
        |item, ctx| async move {
            tokio::time::sleep(Duration::from_millis(5 * (item + 1))).await;
            assert_eq!(ctx.total_tasks, 7);
            if item == 4 {
                TaskOutcome::Failure("boom".to_string())
            } else {
                TaskOutcome::Success(ctx.task_number)
            }
        },
        |_, _| {},
    )
    .await;

    assert_eq!(report.attempted, 7);
    assert_eq!(report.succeeded, 6);
    assert!(!report.results.contains(&5));
}

#[tokio::test]
async fn test_zero_cap_is_treated_as_one() {
    let report = execute_pool(
        vec![1, 2, 3],
        Some(0),
        |item, _ctx| async move { TaskOutcome::Success(item) },
        |_, _| {},
    )
    .await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 3);
}
