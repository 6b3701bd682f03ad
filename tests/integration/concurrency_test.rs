//! Many workers sharing one store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use queuectl_entity::job::{JobState, NewJob};
use queuectl_worker::IterationOutcome;

use crate::helpers::TestQueue;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_job_runs_exactly_once() {
    const JOBS: usize = 24;
    const WORKERS: usize = 4;

    let t = Arc::new(TestQueue::new());
    for i in 0..JOBS {
        t.enqueue(NewJob::new("true").with_id(format!("job-{i:02}")))
            .await;
    }

    let mut handles = Vec::new();
    for w in 0..WORKERS {
        let t = Arc::clone(&t);
        handles.push(tokio::spawn(async move {
            let runner = t.runner(&format!("worker-{w}"));
            let mut completed = Vec::new();
            let mut idle_streak = 0;
            while idle_streak < 3 {
                match runner.run_iteration(Utc::now()).await.unwrap() {
                    IterationOutcome::Completed { job_id, .. } => {
                        idle_streak = 0;
                        completed.push(job_id);
                    }
                    IterationOutcome::Idle => idle_streak += 1,
                    other => panic!("unexpected outcome: {other:?}"),
                }
            }
            completed
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for job_id in handle.await.unwrap() {
            assert!(seen.insert(job_id), "job processed twice");
        }
    }
    assert_eq!(seen.len(), JOBS);

    let stats = t.queue.stats().await.unwrap();
    assert_eq!(stats.count(JobState::Completed), JOBS as i64);
    let completions = t.queue.metric_series("job_completed", 1).await.unwrap();
    assert_eq!(completions.len(), JOBS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lease_attempts_single_winner() {
    let t = Arc::new(TestQueue::new());
    let job = t.enqueue(NewJob::new("true")).await;
    let now = Utc::now();

    let mut handles = Vec::new();
    for w in 0..8 {
        let t = Arc::clone(&t);
        let id = job.id.clone();
        handles.push(tokio::spawn(async move {
            t.store
                .try_acquire_lease(&id, &format!("worker-{w}"), now)
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
