//! Reporting API over a queue driven by a real worker.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use queuectl_core::config::DashboardConfig;
use queuectl_entity::job::NewJob;

use crate::helpers::TestQueue;

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_stats_and_jobs_reflect_worker_progress() {
    let t = TestQueue::new();
    let runner = t.runner("worker-a");
    t.enqueue(NewJob::new("echo ok").with_id("good")).await;
    t.enqueue(NewJob::new("exit 1").with_id("bad").with_max_retries(0))
        .await;
    t.enqueue(
        NewJob::new("true")
            .with_id("later")
            .with_run_at(Utc::now() + chrono::Duration::hours(1)),
    )
    .await;

    runner.run_iteration(Utc::now()).await.unwrap();
    runner.run_iteration(Utc::now()).await.unwrap();

    let app = queuectl_api::build_app(t.queue.clone(), DashboardConfig::default());

    let (status, body) = get(app.clone(), "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["by_state"]["completed"], 1);
    assert_eq!(body["data"]["by_state"]["dead"], 1);
    assert_eq!(body["data"]["by_state"]["pending"], 1);

    let (_, body) = get(app.clone(), "/api/jobs?state=DEAD").await;
    let dead = body["data"].as_array().unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0]["id"], "bad");
    assert_eq!(dead[0]["state"], "dead");

    let (_, body) = get(app.clone(), "/api/metrics?type=job_failed&hours=1").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = get(app, "/api/metrics?type=job_completed").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
