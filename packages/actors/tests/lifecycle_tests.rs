#![allow(clippy::disallowed_methods)]

mod common;

use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use actors::{
    FnHandler, Job, JobEvent, JobHandler, JobId, JobRegistry, JobRequest, JobResult, JobStatus,
    LifecycleError, LifecycleManager, PoolConfig, RegistryError,
};
use tokio::sync::Semaphore;

use common::{echo_handler, failing_handler, gated_handler, wait_for_count, wait_for_terminal};

async fn start(config: PoolConfig) -> Result<(Arc<JobRegistry>, LifecycleManager), LifecycleError> {
    let registry = Arc::new(JobRegistry::new());
    let (manager, _handle) = LifecycleManager::start(registry.clone(), config).await?;
    Ok((registry, manager))
}

#[tokio::test]
async fn test_submit_runs_to_completion() -> Result<(), Box<dyn Error>> {
    let (registry, manager) = start(PoolConfig::default().with_workers(2)).await?;

    let job = manager.submit(JobRequest::new("x.csv"), echo_handler()).await?;
    assert_eq!(job.status, JobStatus::Processing);

    let done = wait_for_terminal(&registry, &job.id).await?;
    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.completed_at.is_some());
    assert_eq!(done.result(), Some(&JobResult::new("processed x.csv")));
    assert!(done.error().is_none());

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_schedule_existing_job() -> Result<(), Box<dyn Error>> {
    let (registry, manager) = start(PoolConfig::default()).await?;

    let job = registry.create(JobRequest::new("y.csv"))?;
    let scheduled = manager.schedule(job.id, echo_handler()).await?;
    assert_eq!(scheduled.id, job.id);
    assert_eq!(scheduled.status, JobStatus::Processing);

    let done = wait_for_terminal(&registry, &job.id).await?;
    assert_eq!(done.status, JobStatus::Completed);

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_schedule_is_exactly_once() -> Result<(), Box<dyn Error>> {
    let (registry, manager) = start(PoolConfig::default()).await?;

    let gate = Arc::new(Semaphore::new(0));
    let job = registry.create(JobRequest::new("x.csv"))?;
    manager.schedule(job.id, gated_handler(gate.clone())).await?;

    let again = manager.schedule(job.id, echo_handler()).await;
    assert_eq!(again.unwrap_err(), LifecycleError::AlreadyScheduled(job.id));

    gate.add_permits(1);
    let done = wait_for_terminal(&registry, &job.id).await?;
    assert_eq!(done.result(), Some(&JobResult::new("released")));

    let after = manager.schedule(job.id, echo_handler()).await;
    assert_eq!(after.unwrap_err(), LifecycleError::AlreadyScheduled(job.id));

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_schedule_unknown_job() -> Result<(), Box<dyn Error>> {
    let (_registry, manager) = start(PoolConfig::default()).await?;

    let unknown = JobId(ulid::Ulid::new());
    let result = manager.schedule(unknown, echo_handler()).await;
    assert_eq!(
        result.unwrap_err(),
        LifecycleError::Registry(RegistryError::NotFound(unknown))
    );

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_handler_error_marks_failed() -> Result<(), Box<dyn Error>> {
    let (registry, manager) = start(PoolConfig::default()).await?;

    let job = manager
        .submit(JobRequest::new("missing.csv"), failing_handler("file not found"))
        .await?;

    let done = wait_for_terminal(&registry, &job.id).await?;
    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.error(), Some("file not found"));
    assert!(done.completed_at.is_some());

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_handler_panic_is_contained() -> Result<(), Box<dyn Error>> {
    let (registry, manager) = start(PoolConfig::default().with_workers(1)).await?;

    let exploding: Arc<dyn JobHandler> = FnHandler::new("explode", |job: &Job| {
        if job.request.data_path == "bad.csv" {
            panic!("unparseable row");
        }
        Box::pin(async move { Ok(JobResult::new("fine")) })
    })
    .shared();

    let bad = manager.submit(JobRequest::new("bad.csv"), exploding.clone()).await?;
    let done = wait_for_terminal(&registry, &bad.id).await?;
    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.error(), Some("job panicked: unparseable row"));

    // The single worker survives and keeps serving.
    let good = manager.submit(JobRequest::new("good.csv"), exploding).await?;
    let done = wait_for_terminal(&registry, &good.id).await?;
    assert_eq!(done.status, JobStatus::Completed);

    let stats = manager.stats().await?;
    assert_eq!(stats.workers, 1);

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_timeout_marks_failed() -> Result<(), Box<dyn Error>> {
    let (registry, manager) = start(PoolConfig::default().with_job_timeout(1)).await?;

    let gate = Arc::new(Semaphore::new(0));
    let job = manager.submit(JobRequest::new("slow.csv"), gated_handler(gate)).await?;

    let mut done = registry.get(&job.id)?;
    for _ in 0..300 {
        if done.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        done = registry.get(&job.id)?;
    }
    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.error(), Some("job timed out after 1s"));

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_full_pool_applies_backpressure() -> Result<(), Box<dyn Error>> {
    let config = PoolConfig::default().with_workers(2).with_queue_capacity(3);
    let (registry, manager) = start(config.clone()).await?;

    let gate = Arc::new(Semaphore::new(0));
    let handler = gated_handler(gate.clone());

    let mut accepted = Vec::new();
    for i in 0..5 {
        let job = manager
            .submit(JobRequest::new(format!("{i}.csv")), handler.clone())
            .await?;
        accepted.push(job.id);
    }

    assert_eq!(accepted.len(), config.max_in_flight());

    let stats = manager.stats().await?;
    assert_eq!(stats.busy_workers, 2);
    assert_eq!(stats.idle_workers, 0);
    assert_eq!(stats.queued, 3);
    assert!(!stats.has_capacity());

    let rejected = manager.submit(JobRequest::new("overflow.csv"), handler.clone()).await;
    assert_eq!(rejected.unwrap_err(), LifecycleError::QueueFull { capacity: 3 });
    // Rejected submissions leave nothing behind.
    assert_eq!(registry.len(), 5);

    let pending = registry.create(JobRequest::new("later.csv"))?;
    let rejected = manager.schedule(pending.id, handler.clone()).await;
    assert_eq!(rejected.unwrap_err(), LifecycleError::QueueFull { capacity: 3 });
    assert_eq!(registry.get(&pending.id)?.status, JobStatus::Pending);

    gate.add_permits(1);
    assert!(wait_for_count(&registry, JobStatus::Completed, 5).await);
    for id in &accepted {
        assert_eq!(registry.get(id)?.status, JobStatus::Completed);
    }

    // Capacity frees up once the backlog drains.
    manager.schedule(pending.id, handler).await?;
    assert!(wait_for_count(&registry, JobStatus::Completed, 6).await);

    manager.shutdown();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions() -> Result<(), Box<dyn Error>> {
    let config = PoolConfig::default().with_workers(4).with_queue_capacity(256);
    let (registry, manager) = start(config).await?;

    let mut tasks = Vec::new();
    for i in 0..100 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move {
            manager
                .submit(JobRequest::new(format!("{i}.csv")), echo_handler())
                .await
        }));
    }

    let mut ids = HashSet::new();
    for task in tasks {
        let job = task.await??;
        assert!(ids.insert(job.id));
    }
    assert_eq!(ids.len(), 100);

    assert!(wait_for_count(&registry, JobStatus::Completed, 100).await);
    let metrics = registry.metrics();
    assert_eq!(metrics.total, 100);
    assert_eq!(metrics.completed, 100);

    let listed: HashSet<JobId> = registry.list().iter().map(|job| job.id).collect();
    assert_eq!(listed, ids);

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_status_sequence_is_lifecycle_prefix() -> Result<(), Box<dyn Error>> {
    let (registry, manager) = start(PoolConfig::default()).await?;
    let mut events = registry.subscribe();

    let ok = manager.submit(JobRequest::new("ok.csv"), echo_handler()).await?;
    let bad = manager
        .submit(JobRequest::new("bad.csv"), failing_handler("boom"))
        .await?;
    wait_for_terminal(&registry, &ok.id).await?;
    wait_for_terminal(&registry, &bad.id).await?;

    let mut transitions: Vec<(JobId, JobStatus, JobStatus)> = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let JobEvent::JobStatusChanged {
            job_id,
            old_status,
            new_status,
            ..
        } = event
        {
            transitions.push((job_id, old_status, new_status));
        }
    }

    let of = |id: JobId| -> Vec<(JobStatus, JobStatus)> {
        transitions
            .iter()
            .filter(|(job_id, _, _)| *job_id == id)
            .map(|(_, from, to)| (*from, *to))
            .collect()
    };
    assert_eq!(
        of(ok.id),
        vec![
            (JobStatus::Pending, JobStatus::Processing),
            (JobStatus::Processing, JobStatus::Completed)
        ]
    );
    assert_eq!(
        of(bad.id),
        vec![
            (JobStatus::Pending, JobStatus::Processing),
            (JobStatus::Processing, JobStatus::Failed)
        ]
    );

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_outcome_visible_when_announced() -> Result<(), Box<dyn Error>> {
    let (registry, manager) = start(PoolConfig::default()).await?;
    let mut events = registry.subscribe();

    let ok = manager.submit(JobRequest::new("ok.csv"), echo_handler()).await?;
    let bad = manager
        .submit(JobRequest::new("bad.csv"), failing_handler("boom"))
        .await?;

    let mut announced = 0;
    while announced < 2 {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv()).await??;
        match event {
            JobEvent::JobCompleted { job_id, .. } => {
                assert_eq!(job_id, ok.id);
                assert_eq!(registry.get(&job_id)?.status, JobStatus::Completed);
                announced += 1;
            }
            JobEvent::JobFailed { job_id, .. } => {
                assert_eq!(job_id, bad.id);
                let job = registry.get(&job_id)?;
                assert_eq!(job.status, JobStatus::Failed);
                assert_eq!(job.error(), Some("boom"));
                announced += 1;
            }
            _ => {}
        }
    }

    manager.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_shutdown_fails_queued_jobs() -> Result<(), Box<dyn Error>> {
    let config = PoolConfig::default().with_workers(1).with_queue_capacity(4);
    let (registry, manager) = start(config).await?;

    let gate = Arc::new(Semaphore::new(0));
    let running = manager
        .submit(JobRequest::new("running.csv"), gated_handler(gate.clone()))
        .await?;
    let queued = manager
        .submit(JobRequest::new("queued.csv"), gated_handler(gate.clone()))
        .await?;

    manager.shutdown();

    let done = wait_for_terminal(&registry, &queued.id).await?;
    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.error(), Some("lifecycle manager shut down"));

    // The running job still finishes on its worker.
    gate.add_permits(1);
    let done = wait_for_terminal(&registry, &running.id).await?;
    assert_eq!(done.status, JobStatus::Completed);

    let after = manager.submit(JobRequest::new("late.csv"), echo_handler()).await;
    assert!(after.is_err());
    Ok(())
}

#[tokio::test]
async fn test_rejects_empty_pool() {
    let registry = Arc::new(JobRegistry::new());
    let result = LifecycleManager::start(registry, PoolConfig::default().with_workers(0)).await;
    assert!(matches!(result, Err(LifecycleError::InvalidConfig(_))));
}
