//! Job registry: the authoritative in-memory store of all jobs.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use job_core::{Job, JobEvent, JobId, JobMetrics, JobOutcome, JobRequest, JobStatus, RegistryError};
use tokio::sync::broadcast;
use ulid::Generator;

/// Capacity of the event broadcast channel.
const EVENT_CAPACITY: usize = 1024;

/// Concurrency-safe map of job ID to job record.
///
/// Every mutation happens under a single write lock, so readers never
/// observe a partially updated job. Jobs are handed out as clones.
pub struct JobRegistry {
    inner: RwLock<RegistryState>,
    event_tx: broadcast::Sender<JobEvent>,
}

struct RegistryState {
    jobs: HashMap<JobId, Job>,
    /// Insertion order, for deterministic listing.
    order: Vec<JobId>,
    ids: Generator,
}

impl JobRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: RwLock::new(RegistryState {
                jobs: HashMap::new(),
                order: Vec::new(),
                ids: Generator::new(),
            }),
            event_tx,
        }
    }

    // A panic cannot happen between the field writes of a single update,
    // so a poisoned lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new pending job for `request` and return it.
    pub fn create(&self, request: JobRequest) -> Result<Job, RegistryError> {
        let mut state = self.write();

        // The generator is monotonic, so ids never repeat.
        let id = JobId::from(state.ids.generate().map_err(|_| RegistryError::IdExhausted)?);

        let job = Job::new(id, request);
        state.jobs.insert(id, job.clone());
        state.order.push(id);

        let _ = self.event_tx.send(JobEvent::JobCreated {
            job_id: id,
            timestamp: job.created_at,
        });
        tracing::debug!("Created job {}", id);

        Ok(job)
    }

    /// Get a job by ID.
    pub fn get(&self, id: &JobId) -> Result<Job, RegistryError> {
        self.read()
            .jobs
            .get(id)
            .cloned()
            .ok_or(RegistryError::NotFound(*id))
    }

    /// Snapshot of every job, in creation order.
    pub fn list(&self) -> Vec<Job> {
        let state = self.read();
        state
            .order
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .cloned()
            .collect()
    }

    /// Move a job to `status`.
    ///
    /// `error` is recorded only when moving to `failed`.
    pub fn update_status(
        &self,
        id: &JobId,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<Job, RegistryError> {
        let outcome = match status {
            JobStatus::Pending | JobStatus::Processing => None,
            JobStatus::Completed => Some(JobOutcome::Completed {
                result: job_core::JobResult::new("completed"),
            }),
            JobStatus::Failed => Some(JobOutcome::failed(
                error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        };
        self.apply(id, status, outcome)
    }

    /// Record the terminal outcome of a job's work.
    pub fn finish(&self, id: &JobId, outcome: JobOutcome) -> Result<Job, RegistryError> {
        self.apply(id, outcome.status(), Some(outcome))
    }

    fn apply(
        &self,
        id: &JobId,
        status: JobStatus,
        outcome: Option<JobOutcome>,
    ) -> Result<Job, RegistryError> {
        let mut state = self.write();
        let job = state.jobs.get_mut(id).ok_or(RegistryError::NotFound(*id))?;

        let old_status = job.status;
        if !old_status.can_transition_to(status) {
            return Err(RegistryError::InvalidTransition {
                id: *id,
                from: old_status,
                to: status,
            });
        }

        let now = Utc::now();
        job.status = status;
        job.updated_at = now;
        if status.is_terminal() {
            job.completed_at = Some(now);
            job.outcome = outcome;
        }

        let _ = self.event_tx.send(JobEvent::JobStatusChanged {
            job_id: *id,
            old_status,
            new_status: status,
            timestamp: now,
        });

        Ok(job.clone())
    }

    /// Count jobs by status from a single snapshot.
    pub fn metrics(&self) -> JobMetrics {
        JobMetrics::tally(&self.list())
    }

    /// Number of jobs ever created.
    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to job events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    /// Sender half of the event channel, for workers to publish on.
    pub fn event_sender(&self) -> broadcast::Sender<JobEvent> {
        self.event_tx.clone()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
