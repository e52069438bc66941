use api::ServiceConfig;
use clap::Parser;
use job_core::PoolConfig;

/// Command-line configuration for the job server.
#[derive(Parser, Debug, Clone)]
#[command(name = "job-server", about = "HTTP service that runs data processing jobs in the background")]
pub struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "JOBS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "JOBS_PORT")]
    pub port: u16,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = 4, env = "JOBS_WORKERS")]
    pub workers: u32,

    /// Jobs that may wait for a free worker before submissions are refused.
    #[arg(long, default_value_t = 1024, env = "JOBS_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Fail jobs that run longer than this many seconds.
    #[arg(long, env = "JOBS_TIMEOUT_SECS")]
    pub job_timeout_secs: Option<u64>,

    /// Simulated work per job, in milliseconds.
    #[arg(long, default_value_t = 2000, env = "JOBS_PROCESSING_DELAY_MS")]
    pub processing_delay_ms: u64,
}

impl Cli {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn service_config(&self) -> ServiceConfig {
        let mut pool = PoolConfig::default()
            .with_workers(self.workers)
            .with_queue_capacity(self.queue_capacity);
        if let Some(secs) = self.job_timeout_secs {
            pool = pool.with_job_timeout(secs);
        }

        ServiceConfig {
            processing_delay_ms: self.processing_delay_ms,
            pool,
            ..ServiceConfig::default()
        }
    }
}
