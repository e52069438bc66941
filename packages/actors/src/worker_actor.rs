//! Worker actor for executing jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use job_core::{JobEvent, JobOutcome};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;

use crate::handler::run_guarded;
use crate::messages::{LifecycleMessage, WorkerMessage};
use crate::registry::JobRegistry;

/// State for the worker actor.
pub struct WorkerActorState {
    /// Unique worker ID.
    pub worker_id: String,
    /// Supervisor to report back to.
    pub supervisor: ActorRef<LifecycleMessage>,
    /// Registry that receives terminal statuses.
    pub registry: Arc<JobRegistry>,
    /// Per-job execution limit.
    pub timeout: Option<Duration>,
    /// Event broadcaster.
    pub event_tx: broadcast::Sender<JobEvent>,
}

impl WorkerActorState {
    fn broadcast(&self, event: JobEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Worker actor arguments.
pub struct WorkerArgs {
    pub worker_id: String,
    pub supervisor: ActorRef<LifecycleMessage>,
    pub registry: Arc<JobRegistry>,
    pub timeout: Option<Duration>,
}

/// Worker actor that executes one job at a time.
pub struct WorkerActor;

impl Actor for WorkerActor {
    type Msg = WorkerMessage;
    type State = WorkerActorState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::debug!("Starting worker: {}", args.worker_id);

        let state = WorkerActorState {
            event_tx: args.registry.event_sender(),
            worker_id: args.worker_id,
            supervisor: args.supervisor,
            registry: args.registry,
            timeout: args.timeout,
        };
        state.broadcast(JobEvent::WorkerConnected {
            worker_id: state.worker_id.clone(),
            timestamp: Utc::now(),
        });

        Ok(state)
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.broadcast(JobEvent::WorkerDisconnected {
            worker_id: state.worker_id.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::ProcessJob { job, handler } => {
                let job_id = job.id;
                let started_at = Utc::now();
                tracing::debug!(
                    "Worker {} running job {} with {}",
                    state.worker_id,
                    job_id,
                    handler.name()
                );
                state.broadcast(JobEvent::JobStarted {
                    job_id,
                    worker_id: state.worker_id.clone(),
                    timestamp: started_at,
                });

                let outcome = JobOutcome::from(run_guarded(handler.as_ref(), &job, state.timeout).await);
                let now = Utc::now();

                let event = match &outcome {
                    JobOutcome::Completed { .. } => JobEvent::JobCompleted {
                        job_id,
                        duration_ms: (now - started_at).num_milliseconds().max(0) as u64,
                        timestamp: now,
                    },
                    JobOutcome::Failed { error } => {
                        tracing::warn!("Job {} failed: {}", job_id, error);
                        JobEvent::JobFailed {
                            job_id,
                            error: error.clone(),
                            timestamp: now,
                        }
                    }
                };

                // Announce the outcome only once readers can see it.
                match state.registry.finish(&job_id, outcome) {
                    Ok(_) => state.broadcast(event),
                    Err(e) => tracing::warn!("Failed to finalize job {}: {}", job_id, e),
                }

                // The supervisor may already be gone during shutdown.
                let _ = state.supervisor.send_message(LifecycleMessage::WorkerIdle {
                    worker: myself.get_id(),
                });
            }

            WorkerMessage::Shutdown => {
                tracing::debug!("Shutting down worker: {}", state.worker_id);
                myself.stop(None);
            }
        }

        Ok(())
    }
}
