//! Worker pool configuration and statistics.

use serde::{Deserialize, Serialize};

/// Configuration for the background worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of concurrent workers.
    pub workers: u32,
    /// Maximum number of accepted jobs waiting for a free worker.
    pub queue_capacity: usize,
    /// Per-job execution limit in seconds. `None` lets work run to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_timeout_secs: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            job_timeout_secs: None,
        }
    }
}

impl PoolConfig {
    /// Set the number of workers.
    pub fn with_workers(mut self, workers: u32) -> Self {
        self.workers = workers;
        self
    }

    /// Set the pending queue capacity.
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Set the per-job timeout.
    pub fn with_job_timeout(mut self, timeout_secs: u64) -> Self {
        self.job_timeout_secs = Some(timeout_secs);
        self
    }

    /// Most jobs the pool holds at once (executing plus queued).
    pub fn max_in_flight(&self) -> usize {
        self.workers as usize + self.queue_capacity
    }
}

/// Snapshot of the worker pool's current load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolStats {
    /// Workers currently alive.
    pub workers: u32,
    /// Workers waiting for a job.
    pub idle_workers: u32,
    /// Workers executing a job.
    pub busy_workers: u32,
    /// Jobs accepted but not yet picked up.
    pub queued: usize,
    /// Maximum number of queued jobs.
    pub queue_capacity: usize,
}

impl PoolStats {
    /// Whether another job can be accepted right now.
    pub fn has_capacity(&self) -> bool {
        self.idle_workers > 0 || self.queued < self.queue_capacity
    }
}
