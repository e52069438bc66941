//! HTTP interface for the job processing service.
//!
//! This crate exposes the registry and lifecycle manager over HTTP:
//! - Service status (`/`, `/health`)
//! - Job submission, lookup and listing (`/process`, `/jobs`, `/jobs/{id}`)
//! - Aggregate counts (`/metrics`)
//! - Real-time lifecycle events (`/events`, SSE)

mod error;
mod init;
mod jobs;
mod processor;
mod realtime;
mod server;
mod status;

use axum::Router;
use axum::routing::{get, post};

pub use error::ApiError;
pub use init::{AppState, ServiceConfig, init_job_service};
pub use jobs::{JobListResponse, JobRecord, JobStatusResponse, MetricsResponse, SubmitResponse};
pub use processor::DataProcessor;
pub use realtime::spawn_event_log;
pub use server::{serve, shutdown_signal};
pub use status::{HealthResponse, ServiceInfo};

// Re-export core types for convenience
pub use actors::{JobHandler, LifecycleManager};
pub use job_core::{Job, JobEvent, JobId, JobRequest, JobResult, JobStatus, PoolConfig, PoolStats};

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status::root))
        .route("/health", get(status::health))
        .route("/process", post(jobs::submit_job))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/metrics", get(jobs::metrics))
        .route("/events", get(realtime::stream_events))
        .with_state(state)
}
