//! Point-in-time job counts.

use serde::{Deserialize, Serialize};

use crate::{Job, JobStatus};

/// Job counts by status, computed from a single registry snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMetrics {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

impl JobMetrics {
    /// Count the given jobs by status.
    pub fn tally<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        jobs.into_iter().fold(Self::default(), |mut metrics, job| {
            metrics.total += 1;
            match job.status {
                JobStatus::Pending => metrics.pending += 1,
                JobStatus::Processing => metrics.processing += 1,
                JobStatus::Completed => metrics.completed += 1,
                JobStatus::Failed => metrics.failed += 1,
            }
            metrics
        })
    }

    /// Number of jobs with the given status.
    pub fn count(&self, status: JobStatus) -> u64 {
        match status {
            JobStatus::Pending => self.pending,
            JobStatus::Processing => self.processing,
            JobStatus::Completed => self.completed,
            JobStatus::Failed => self.failed,
        }
    }

    /// Jobs not yet finished (pending + processing).
    pub fn active(&self) -> u64 {
        self.pending + self.processing
    }

    /// Total finished jobs.
    pub fn finished(&self) -> u64 {
        self.completed + self.failed
    }

    /// Success rate as a percentage.
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.finished();
        if total == 0 {
            None
        } else {
            Some((self.completed as f64 / total as f64) * 100.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobId, JobOutcome, JobRequest};

    fn job_with(status: JobStatus) -> Job {
        let mut job = Job::new(JobId(ulid::Ulid::new()), JobRequest::new("x.csv"));
        job.status = status;
        if status == JobStatus::Failed {
            job.outcome = Some(JobOutcome::failed("boom"));
        }
        job
    }

    #[test]
    fn tally_counts_sum_to_total() {
        let jobs: Vec<Job> = [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Completed,
            JobStatus::Completed,
            JobStatus::Failed,
        ]
        .into_iter()
        .map(job_with)
        .collect();

        let metrics = JobMetrics::tally(&jobs);
        assert_eq!(metrics.total, 7);
        assert_eq!(metrics.pending, 1);
        assert_eq!(metrics.processing, 2);
        assert_eq!(metrics.completed, 3);
        assert_eq!(metrics.failed, 1);
        assert_eq!(
            JobStatus::ALL.iter().map(|s| metrics.count(*s)).sum::<u64>(),
            metrics.total
        );
        assert_eq!(metrics.active(), 3);
        assert_eq!(metrics.success_rate(), Some(75.0));
    }

    #[test]
    fn empty_snapshot() {
        let metrics = JobMetrics::tally(std::iter::empty());
        assert_eq!(metrics, JobMetrics::default());
        assert_eq!(metrics.success_rate(), None);
    }
}
