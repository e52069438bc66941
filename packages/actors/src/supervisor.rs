//! Supervisor actor that owns the worker pool and schedules jobs onto it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use job_core::{Job, JobId, JobOutcome, JobRequest, JobStatus, PoolConfig, PoolStats, RegistryError};
use ractor::{Actor, ActorId, ActorProcessingErr, ActorRef, RpcReplyPort, SupervisionEvent};

use crate::handler::JobHandler;
use crate::messages::{LifecycleError, LifecycleMessage, LifecycleResult, WorkerMessage};
use crate::registry::JobRegistry;
use crate::worker_actor::{WorkerActor, WorkerArgs};

/// A job accepted by the pool, waiting for a free worker.
struct QueuedJob {
    job: Job,
    handler: Arc<dyn JobHandler>,
}

struct WorkerHandle {
    worker_id: String,
    actor: ActorRef<WorkerMessage>,
}

/// State for the supervisor actor.
pub struct SupervisorState {
    registry: Arc<JobRegistry>,
    config: PoolConfig,
    /// Live workers by actor ID.
    workers: HashMap<ActorId, WorkerHandle>,
    /// Workers waiting for a job, longest idle first.
    idle: VecDeque<ActorId>,
    /// Accepted jobs not yet handed to a worker.
    pending: VecDeque<QueuedJob>,
    /// Job currently held by each busy worker.
    in_flight: HashMap<ActorId, JobId>,
    /// Worker counter for unique IDs.
    worker_counter: u64,
    shutting_down: bool,
}

impl SupervisorState {
    fn new(registry: Arc<JobRegistry>, config: PoolConfig) -> Self {
        Self {
            registry,
            config,
            workers: HashMap::new(),
            idle: VecDeque::new(),
            pending: VecDeque::new(),
            in_flight: HashMap::new(),
            worker_counter: 0,
            shutting_down: false,
        }
    }

    /// Generate a unique worker ID.
    fn next_worker_id(&mut self) -> String {
        self.worker_counter += 1;
        format!("worker-{}", self.worker_counter)
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.workers.len() as u32,
            idle_workers: self.idle.len() as u32,
            busy_workers: self.in_flight.len() as u32,
            queued: self.pending.len(),
            queue_capacity: self.config.queue_capacity,
        }
    }

    fn queue_full(&self) -> LifecycleError {
        tracing::warn!(
            "Rejecting job: pool holds its limit of {} jobs ({} queued)",
            self.config.max_in_flight(),
            self.pending.len()
        );
        LifecycleError::QueueFull {
            capacity: self.config.queue_capacity,
        }
    }

    /// Move a pending job to `processing` and queue it for a worker.
    fn accept(&mut self, job_id: JobId, handler: Arc<dyn JobHandler>) -> LifecycleResult<Job> {
        let current = self.registry.get(&job_id)?;
        if current.status != JobStatus::Pending {
            return Err(LifecycleError::AlreadyScheduled(job_id));
        }
        if !self.stats().has_capacity() {
            return Err(self.queue_full());
        }

        let job = self
            .registry
            .update_status(&job_id, JobStatus::Processing, None)
            .map_err(|e| match e {
                RegistryError::InvalidTransition { id, .. } => LifecycleError::AlreadyScheduled(id),
                other => other.into(),
            })?;

        self.pending.push_back(QueuedJob {
            job: job.clone(),
            handler,
        });
        self.dispatch();

        Ok(job)
    }

    /// Hand queued jobs to idle workers.
    fn dispatch(&mut self) {
        while !self.pending.is_empty() {
            let Some(worker) = self.idle.pop_front() else {
                break;
            };
            let Some(handle) = self.workers.get(&worker) else {
                continue;
            };
            let Some(queued) = self.pending.pop_front() else {
                break;
            };

            let job_id = queued.job.id;
            let message = WorkerMessage::ProcessJob {
                job: Box::new(queued.job.clone()),
                handler: queued.handler.clone(),
            };
            match handle.actor.send_message(message) {
                Ok(()) => {
                    self.in_flight.insert(worker, job_id);
                }
                Err(_) => {
                    // The worker is on its way out; its replacement picks this up.
                    tracing::warn!("Worker {} unreachable, requeueing job {}", handle.worker_id, job_id);
                    self.pending.push_front(queued);
                }
            }
        }
    }

    fn fail_job(&self, job_id: &JobId, error: &str) {
        if let Err(e) = self.registry.finish(job_id, JobOutcome::failed(error)) {
            tracing::warn!("Failed to mark job {} failed: {}", job_id, e);
        }
    }

    /// Fail every queued job.
    fn fail_queued(&mut self, error: &str) {
        for queued in std::mem::take(&mut self.pending) {
            self.fail_job(&queued.job.id, error);
        }
    }

    /// Fail every job the pool still holds, queued or running.
    fn fail_outstanding(&mut self, error: &str) {
        self.fail_queued(error);
        for (_, job_id) in std::mem::take(&mut self.in_flight) {
            self.fail_job(&job_id, error);
        }
    }
}

async fn spawn_worker(
    myself: &ActorRef<LifecycleMessage>,
    state: &mut SupervisorState,
) -> Result<(), ActorProcessingErr> {
    let worker_id = state.next_worker_id();
    let args = WorkerArgs {
        worker_id: worker_id.clone(),
        supervisor: myself.clone(),
        registry: state.registry.clone(),
        timeout: state.config.job_timeout_secs.map(Duration::from_secs),
    };

    let (actor, _handle) = Actor::spawn_linked(None, WorkerActor, args, myself.get_cell())
        .await
        .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn worker: {}", e)))?;

    let id = actor.get_id();
    state.workers.insert(id, WorkerHandle { worker_id, actor });
    state.idle.push_back(id);
    Ok(())
}

/// Supervisor actor arguments.
pub struct SupervisorArgs {
    pub registry: Arc<JobRegistry>,
    pub config: PoolConfig,
}

/// Supervisor actor that manages the worker pool.
pub struct Supervisor;

impl Actor for Supervisor {
    type Msg = LifecycleMessage;
    type State = SupervisorState;
    type Arguments = SupervisorArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting lifecycle supervisor with {} workers (queue capacity {})",
            args.config.workers,
            args.config.queue_capacity
        );

        let mut state = SupervisorState::new(args.registry, args.config);
        for _ in 0..state.config.workers {
            spawn_worker(&myself, &mut state).await?;
        }

        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            LifecycleMessage::Submit {
                request,
                handler,
                reply,
            } => {
                let result = if state.shutting_down {
                    Err(LifecycleError::Unavailable)
                } else if !state.stats().has_capacity() {
                    Err(state.queue_full())
                } else {
                    state
                        .registry
                        .create(request)
                        .map_err(LifecycleError::from)
                        .and_then(|job| state.accept(job.id, handler))
                };
                let _ = reply.send(result);
            }

            LifecycleMessage::Schedule {
                job_id,
                handler,
                reply,
            } => {
                let result = if state.shutting_down {
                    Err(LifecycleError::Unavailable)
                } else {
                    state.accept(job_id, handler)
                };
                let _ = reply.send(result);
            }

            LifecycleMessage::WorkerIdle { worker } => {
                state.in_flight.remove(&worker);
                if !state.shutting_down && state.workers.contains_key(&worker) {
                    state.idle.push_back(worker);
                    state.dispatch();
                }
            }

            LifecycleMessage::GetStats { reply } => {
                let _ = reply.send(state.stats());
            }

            LifecycleMessage::Shutdown => {
                tracing::info!("Shutting down lifecycle supervisor");
                state.shutting_down = true;

                state.fail_queued("lifecycle manager shut down");
                // Workers finish their current job before handling this.
                for worker in state.workers.values() {
                    let _ = worker.actor.send_message(WorkerMessage::Shutdown);
                }
                if state.workers.is_empty() {
                    myself.stop(None);
                }
            }
        }

        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let (id, reason) = match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                (cell.get_id(), reason.unwrap_or_else(|| "stopped".to_string()))
            }
            SupervisionEvent::ActorFailed(cell, err) => (cell.get_id(), err.to_string()),
            _ => return Ok(()),
        };

        let Some(worker) = state.workers.remove(&id) else {
            return Ok(());
        };
        state.idle.retain(|w| *w != id);

        if state.shutting_down {
            if state.workers.is_empty() {
                tracing::info!("All workers stopped, lifecycle supervisor exiting");
                myself.stop(None);
            }
            return Ok(());
        }

        tracing::warn!("Worker {} terminated: {}", worker.worker_id, reason);
        if let Some(job_id) = state.in_flight.remove(&id) {
            state.fail_job(&job_id, "worker terminated unexpectedly");
        }

        if let Err(e) = spawn_worker(&myself, state).await {
            tracing::error!("Cannot replace worker {}: {}", worker.worker_id, e);
            state.fail_outstanding("worker pool stopped");
            return Err(e);
        }
        state.dispatch();
        Ok(())
    }
}

/// Handle to a running lifecycle supervisor.
///
/// Cheap to clone; all clones talk to the same worker pool.
#[derive(Clone)]
pub struct LifecycleManager {
    actor: ActorRef<LifecycleMessage>,
    registry: Arc<JobRegistry>,
}

impl LifecycleManager {
    /// Start the supervisor and its workers.
    pub async fn start(
        registry: Arc<JobRegistry>,
        config: PoolConfig,
    ) -> LifecycleResult<(Self, tokio::task::JoinHandle<()>)> {
        if config.workers == 0 {
            return Err(LifecycleError::InvalidConfig(
                "at least one worker is required".into(),
            ));
        }

        let args = SupervisorArgs {
            registry: registry.clone(),
            config,
        };
        let (actor, handle) = Actor::spawn(None, Supervisor, args)
            .await
            .map_err(|e| LifecycleError::Spawn(e.to_string()))?;

        Ok((Self { actor, registry }, handle))
    }

    /// The registry this manager finalizes jobs in.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Create a job for `request` and schedule it with `handler`.
    ///
    /// Capacity is checked before the job is created, so a rejected
    /// submission leaves nothing behind in the registry.
    pub async fn submit(
        &self,
        request: JobRequest,
        handler: Arc<dyn JobHandler>,
    ) -> LifecycleResult<Job> {
        self.call(|reply| LifecycleMessage::Submit {
            request,
            handler,
            reply,
        })
        .await?
    }

    /// Schedule an existing pending job. Returns once the job is queued.
    pub async fn schedule(
        &self,
        job_id: JobId,
        handler: Arc<dyn JobHandler>,
    ) -> LifecycleResult<Job> {
        self.call(|reply| LifecycleMessage::Schedule {
            job_id,
            handler,
            reply,
        })
        .await?
    }

    /// Current pool load.
    pub async fn stats(&self) -> LifecycleResult<PoolStats> {
        self.call(|reply| LifecycleMessage::GetStats { reply }).await
    }

    /// Stop accepting work and wind the pool down.
    ///
    /// Queued jobs are failed; jobs already running finish first.
    pub fn shutdown(&self) {
        let _ = self.actor.send_message(LifecycleMessage::Shutdown);
    }

    async fn call<T: Send + 'static>(
        &self,
        build: impl FnOnce(RpcReplyPort<T>) -> LifecycleMessage,
    ) -> LifecycleResult<T> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(build(tx.into()))
            .map_err(|_| LifecycleError::Unavailable)?;
        rx.await.map_err(|_| LifecycleError::Unavailable)
    }
}
