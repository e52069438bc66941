//! Job endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use job_core::{Job, JobId, JobRequest, JobResult, JobStatus};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::init::AppState;

/// Response to an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

/// Status view of a single job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            created_at: job.created_at,
            completed_at: job.completed_at,
            error: job.error().map(str::to_string),
            result: job.result().cloned(),
        }
    }
}

/// Listing entry: the status view plus the original request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(flatten)]
    pub job: JobStatusResponse,
    pub request: JobRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub total_jobs: u64,
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    pub timestamp: DateTime<Utc>,
}

/// `POST /process`: register a job and hand it to the worker pool.
pub(crate) async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    if request.data_path.trim().is_empty() {
        return Err(ApiError::BadRequest("data_path must not be empty".into()));
    }

    let job = state
        .lifecycle
        .submit(request, state.processor.clone())
        .await?;
    tracing::info!("Started job {} for {}", job.id, job.request.data_path);

    Ok((
        StatusCode::OK,
        Json(SubmitResponse {
            job_id: job.id,
            status: job.status,
            created_at: job.created_at,
        }),
    ))
}

/// `GET /jobs/{id}`. Ids that do not parse cannot name a job, so they are
/// reported as not found.
pub(crate) async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let id = JobId::parse(&id).map_err(|_| ApiError::NotFound)?;
    let job = state.registry.get(&id)?;
    Ok(Json(JobStatusResponse::from(&job)))
}

/// `GET /jobs`
pub(crate) async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    let jobs: Vec<JobRecord> = state
        .registry
        .list()
        .iter()
        .map(|job| JobRecord {
            job: JobStatusResponse::from(job),
            request: job.request.clone(),
        })
        .collect();

    Json(JobListResponse {
        count: jobs.len(),
        jobs,
    })
}

/// `GET /metrics`
pub(crate) async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let metrics = state.registry.metrics();
    Json(MetricsResponse {
        total_jobs: metrics.total,
        pending: metrics.pending,
        processing: metrics.processing,
        completed: metrics.completed,
        failed: metrics.failed,
        timestamp: Utc::now(),
    })
}
