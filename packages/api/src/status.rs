//! Service status endpoints.

use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use job_core::PoolStats;
use serde::{Deserialize, Serialize};

use crate::init::AppState;

/// How long `/health` waits for the worker pool to answer.
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<PoolStats>,
}

/// `GET /`
pub(crate) async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: state.service_name.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

/// `GET /health`: healthy while the worker pool answers.
pub(crate) async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match tokio::time::timeout(HEALTH_PROBE_TIMEOUT, state.lifecycle.stats()).await {
        Ok(Ok(stats)) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                timestamp: Utc::now(),
                workers: Some(stats),
            }),
        ),
        Ok(Err(e)) => degraded(e.to_string()),
        Err(_) => degraded("worker pool did not answer".to_string()),
    }
}

fn degraded(reason: String) -> (StatusCode, Json<HealthResponse>) {
    tracing::warn!("Health check degraded: {}", reason);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HealthResponse {
            status: "degraded".to_string(),
            timestamp: Utc::now(),
            workers: None,
        }),
    )
}
