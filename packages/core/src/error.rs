//! Registry error types.

use thiserror::Error;

use crate::{JobId, JobStatus};

/// Errors returned by job registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Invalid transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Job identifier space exhausted")]
    IdExhausted,
}
