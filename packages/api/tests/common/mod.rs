#![allow(dead_code)]

use std::time::Duration;

use api::{AppState, PoolConfig, ServiceConfig, init_job_service, router};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::task::JoinHandle;
use tower::ServiceExt;

pub fn config(workers: u32, queue_capacity: usize, processing_delay_ms: u64) -> ServiceConfig {
    ServiceConfig {
        name: "Test Job API".to_string(),
        processing_delay_ms,
        pool: PoolConfig::default()
            .with_workers(workers)
            .with_queue_capacity(queue_capacity),
    }
}

pub async fn app(config: ServiceConfig) -> (AppState, JoinHandle<()>) {
    init_job_service(config).await.expect("service starts")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

/// Run one request through a fresh router and decode the JSON body.
pub async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Poll `GET /jobs/{id}` until the job reports `status`.
pub async fn wait_for_status(state: &AppState, id: &str, status: &str) -> Value {
    let mut last = Value::Null;
    for _ in 0..300 {
        let (code, body) = send(state, get(&format!("/jobs/{id}"))).await;
        assert_eq!(code, StatusCode::OK);
        if body["status"] == status {
            return body;
        }
        last = body;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached {status}, last seen {last}");
}
