//! Core domain types for the job runner.
//!
//! This crate contains shared types used across all packages:
//! - Job, JobStatus and JobOutcome for submitted work
//! - JobMetrics for point-in-time counts
//! - PoolConfig and PoolStats for the worker pool
//! - Events for lifecycle notifications

mod error;
mod events;
mod job;
mod metrics;
mod pool;

pub use error::RegistryError;
pub use events::JobEvent;
pub use job::{Job, JobId, JobOutcome, JobRequest, JobResult, JobStatus};
pub use metrics::JobMetrics;
pub use pool::{PoolConfig, PoolStats};
