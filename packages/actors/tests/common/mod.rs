#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actors::{FnHandler, Job, JobHandler, JobId, JobRegistry, JobResult, JobStatus, RegistryError};
use tokio::sync::Semaphore;

/// Handler that succeeds immediately, echoing the data path.
pub fn echo_handler() -> Arc<dyn JobHandler> {
    FnHandler::new("echo", |job: &Job| {
        let path = job.request.data_path.clone();
        Box::pin(async move { Ok(JobResult::new(format!("processed {}", path))) })
    })
    .shared()
}

/// Handler that always fails with `error`.
pub fn failing_handler(error: &'static str) -> Arc<dyn JobHandler> {
    FnHandler::new("fail", move |_job: &Job| Box::pin(async move { Err(error.to_string()) }))
        .shared()
}

/// Handler that blocks until `gate` has a permit. Permits are handed back
/// when the job finishes, so `add_permits(1)` drains every gated job in turn.
pub fn gated_handler(gate: Arc<Semaphore>) -> Arc<dyn JobHandler> {
    FnHandler::new("gated", move |_job: &Job| {
        let gate = gate.clone();
        Box::pin(async move {
            match gate.acquire().await {
                Ok(_permit) => Ok(JobResult::new("released")),
                Err(e) => Err(e.to_string()),
            }
        })
    })
    .shared()
}

/// Poll the registry until the job is terminal.
pub async fn wait_for_terminal(registry: &JobRegistry, id: &JobId) -> Result<Job, RegistryError> {
    for _ in 0..200 {
        let job = registry.get(id)?;
        if job.status.is_terminal() {
            return Ok(job);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    registry.get(id)
}

/// Poll until `count` jobs reached `status`.
pub async fn wait_for_count(registry: &JobRegistry, status: JobStatus, count: u64) -> bool {
    for _ in 0..200 {
        if registry.metrics().count(status) >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
