//! Message types for actor communication.

use std::sync::Arc;

use job_core::{Job, JobId, JobRequest, PoolStats, RegistryError};
use ractor::{ActorId, RpcReplyPort};

use crate::handler::JobHandler;

/// Messages for the lifecycle supervisor.
pub enum LifecycleMessage {
    /// Create a job and hand it to the pool in one step.
    Submit {
        request: JobRequest,
        handler: Arc<dyn JobHandler>,
        reply: RpcReplyPort<Result<Job, LifecycleError>>,
    },

    /// Hand an existing pending job to the pool.
    Schedule {
        job_id: JobId,
        handler: Arc<dyn JobHandler>,
        reply: RpcReplyPort<Result<Job, LifecycleError>>,
    },

    /// A worker finished its job and can take another.
    WorkerIdle { worker: ActorId },

    /// Get pool stats.
    GetStats { reply: RpcReplyPort<PoolStats> },

    /// Stop all workers and the supervisor.
    Shutdown,
}

/// Messages for a worker actor.
pub enum WorkerMessage {
    /// Execute a job.
    ProcessJob {
        job: Box<Job>,
        handler: Arc<dyn JobHandler>,
    },

    /// Shutdown the worker.
    Shutdown,
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Error type for lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Worker queue is full ({capacity} jobs waiting)")]
    QueueFull { capacity: usize },

    #[error("Job already scheduled: {0}")]
    AlreadyScheduled(JobId),

    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn actor: {0}")]
    Spawn(String),

    #[error("Lifecycle manager is not running")]
    Unavailable,
}
