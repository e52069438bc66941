//! Job registry and actor-based lifecycle management.
//!
//! # Architecture
//!
//! - `JobRegistry` - Concurrency-safe store of every job and its status
//! - `Supervisor` - Actor that owns the worker pool and its bounded queue
//! - `WorkerActor` - Executes one job at a time and finalizes its status
//!
//! # Usage
//!
//! ```ignore
//! use actors::{JobRegistry, LifecycleManager, FnHandler};
//!
//! let registry = Arc::new(JobRegistry::new());
//! let (manager, _handle) = LifecycleManager::start(registry.clone(), PoolConfig::default()).await?;
//!
//! let job = manager.submit(JobRequest::new("input.csv"), handler).await?;
//! let status = registry.get(&job.id)?.status;
//! ```

mod handler;
mod messages;
pub mod registry;
mod supervisor;
mod worker_actor;

pub use handler::{FnHandler, HandlerFuture, HandlerResult, JobHandler};
pub use messages::{LifecycleError, LifecycleMessage, LifecycleResult, WorkerMessage};
pub use registry::JobRegistry;
pub use supervisor::{LifecycleManager, Supervisor};
pub use worker_actor::WorkerActor;

/// Re-export core types used by handlers.
pub use job_core::{
    Job, JobEvent, JobId, JobMetrics, JobOutcome, JobRequest, JobResult, JobStatus, PoolConfig,
    PoolStats, RegistryError,
};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef};
