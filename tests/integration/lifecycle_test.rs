//! Job lifecycle integration tests.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use queuectl_core::error::ErrorKind;
use queuectl_entity::config::BACKOFF_BASE_KEY;
use queuectl_entity::job::{JobState, NewJob};
use queuectl_worker::{CommandExecutor, ExecutionStatus, IterationOutcome};

use crate::helpers::TestQueue;

#[tokio::test]
async fn test_echo_job_completes() {
    let t = TestQueue::new();
    let runner = t.runner("worker-a");
    let job = t
        .enqueue(
            NewJob::new("echo hello")
                .with_max_retries(0)
                .with_timeout(Duration::from_millis(5000)),
        )
        .await;

    let outcome = runner.run_iteration(Utc::now()).await.unwrap();
    assert!(matches!(outcome, IterationOutcome::Completed { ref job_id, .. } if *job_id == job.id));

    let done = t.job(&job.id).await;
    assert_eq!(done.state, JobState::Completed);
    assert_eq!(done.output.as_deref(), Some("hello\n"));
    assert_eq!(done.attempts, 0);
    assert!(done.started_at.is_some());
    assert!(done.completed_at.is_some());
    assert!(done.duration_ms.is_some());
    assert!(done.locked_by.is_none());
}

#[tokio::test]
async fn test_failing_job_backs_off_then_dead_letters() {
    let t = TestQueue::new();
    t.queue.set_config(BACKOFF_BASE_KEY, "2").await.unwrap();
    let runner = t.runner("worker-a");
    let job = t
        .enqueue(NewJob::new("exit 1").with_max_retries(2))
        .await;

    // Attempt 1: retry in ~2s.
    let before = Utc::now();
    let first = runner.run_iteration(Utc::now()).await.unwrap();
    let after = Utc::now();
    let IterationOutcome::RetryScheduled {
        attempts: 1,
        next_retry_at: Some(next1),
        ..
    } = first
    else {
        panic!("unexpected outcome: {first:?}");
    };
    assert!(next1 >= before + ChronoDuration::seconds(2));
    assert!(next1 <= after + ChronoDuration::seconds(2));

    let failed = t.job(&job.id).await;
    assert_eq!(failed.state, JobState::Failed);
    assert_eq!(failed.error.as_deref(), Some("Exit code 1"));
    assert!(failed.locked_by.is_none());

    // Not eligible before its retry time.
    assert_eq!(
        runner.run_iteration(before).await.unwrap(),
        IterationOutcome::Idle
    );

    // Attempt 2, observed at the first retry time: retry 4s later.
    let second = runner.run_iteration(next1).await.unwrap();
    let IterationOutcome::RetryScheduled {
        attempts: 2,
        next_retry_at: Some(next2),
        ..
    } = second
    else {
        panic!("unexpected outcome: {second:?}");
    };
    assert_eq!(next2, next1 + ChronoDuration::seconds(4));

    // Attempt 3 exceeds max_retries.
    let third = runner.run_iteration(next2).await.unwrap();
    assert_eq!(
        third,
        IterationOutcome::DeadLettered {
            job_id: job.id.clone(),
            attempts: 3,
        }
    );

    let dead = t.job(&job.id).await;
    assert_eq!(dead.state, JobState::Dead);
    assert_eq!(dead.attempts, 3);
    assert!(dead.next_retry_at.is_none());
    assert!(dead.locked_by.is_none());

    // Dead is terminal for the worker.
    assert_eq!(
        runner
            .run_iteration(next2 + ChronoDuration::days(1))
            .await
            .unwrap(),
        IterationOutcome::Idle
    );

    let dlq = t.queue.dead_letters().await.unwrap();
    assert_eq!(dlq.len(), 1);
    assert_eq!(dlq[0].id, job.id);

    let failed_metrics = t.queue.metric_series("job_failed", 1).await.unwrap();
    assert_eq!(failed_metrics.len(), 1);
}

#[tokio::test]
async fn test_timeout_counts_as_failed_attempt() {
    let result = CommandExecutor::new()
        .execute("sleep 5", Duration::from_millis(100))
        .await;
    assert_eq!(result.status, ExecutionStatus::TimedOut);
    assert!(result.duration_ms >= 100 && result.duration_ms < 2000);

    let t = TestQueue::new();
    let runner = t.runner("worker-a");
    let job = t
        .enqueue(NewJob::new("sleep 5").with_timeout(Duration::from_millis(100)))
        .await;

    let outcome = runner.run_iteration(Utc::now()).await.unwrap();
    assert!(matches!(
        outcome,
        IterationOutcome::RetryScheduled { attempts: 1, .. }
    ));

    let failed = t.job(&job.id).await;
    assert_eq!(failed.state, JobState::Failed);
    assert_eq!(failed.attempts, 1);
    assert_eq!(failed.error.as_deref(), Some("Job timed out after 100ms"));
}

#[tokio::test]
async fn test_prefix_resolution() {
    let t = TestQueue::new();
    t.enqueue(NewJob::new("true").with_id("abc123")).await;
    t.enqueue(NewJob::new("true").with_id("abc456")).await;

    let err = t.queue.resolve("abc").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AmbiguousId);

    assert_eq!(t.queue.resolve("abc1").await.unwrap().id, "abc123");
    assert_eq!(t.queue.resolve("abc456").await.unwrap().id, "abc456");
}

#[tokio::test]
async fn test_requeue_after_dead_letter_runs_again() {
    let t = TestQueue::new();
    let runner = t.runner("worker-a");
    let job = t
        .enqueue(NewJob::new("exit 3").with_id("flaky").with_max_retries(0))
        .await;

    let outcome = runner.run_iteration(Utc::now()).await.unwrap();
    assert!(matches!(
        outcome,
        IterationOutcome::DeadLettered { attempts: 1, .. }
    ));

    let revived = t.queue.requeue("flaky").await.unwrap();
    assert_eq!(revived.state, JobState::Pending);
    assert_eq!(revived.attempts, 0);
    assert!(revived.error.is_none());
    assert!(revived.next_retry_at.is_none());

    let err = t.queue.requeue("flaky").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotDead);

    // Re-queued jobs are claimable again.
    let outcome = runner.run_iteration(Utc::now()).await.unwrap();
    assert!(matches!(
        outcome,
        IterationOutcome::DeadLettered { ref job_id, attempts: 1 } if *job_id == job.id
    ));
}

#[tokio::test]
async fn test_candidates_exclude_future_and_locked_jobs() {
    let t = TestQueue::new();
    let now = Utc::now();
    t.enqueue(
        NewJob::new("true")
            .with_id("future")
            .with_run_at(now + ChronoDuration::hours(1)),
    )
    .await;
    t.enqueue(NewJob::new("true").with_id("held")).await;
    t.enqueue(NewJob::new("true").with_id("free")).await;
    assert!(t.store.try_acquire_lease("held", "worker-x", now).await.unwrap());

    let candidates = t.queue.candidates(10, now).await.unwrap();
    for job in &candidates {
        assert!(job.locked_by.is_none());
        assert!(job.run_at.is_none_or(|at| at <= now));
    }
    let ids: Vec<&str> = candidates.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["free"]);
}

#[tokio::test]
async fn test_stale_candidate_is_not_rerun() {
    let t = TestQueue::new();
    let job = t.enqueue(NewJob::new("true").with_id("once")).await;
    let now = Utc::now();

    let stale = t.queue.candidates(10, now).await.unwrap();
    assert_eq!(stale.len(), 1);

    let winner = t.runner("worker-a");
    assert!(matches!(
        winner.run_iteration(now).await.unwrap(),
        IterationOutcome::Completed { .. }
    ));

    // A slower worker acting on its old snapshot must not claim it.
    assert!(!t.store.try_acquire_lease(&job.id, "worker-b", now).await.unwrap());
    assert_eq!(t.job(&job.id).await.state, JobState::Completed);
}
