//! Built-in data processor.

use std::sync::Arc;
use std::time::Duration;

use actors::{HandlerFuture, JobHandler};
use job_core::{Job, JobResult};
use serde_json::json;

/// Stand-in processing step: waits out a fixed delay, then reports the
/// paths it was given.
///
/// Setting the `simulate_failure` option to `true` fails the job instead.
pub struct DataProcessor {
    delay: Duration,
}

impl DataProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn shared(self) -> Arc<dyn JobHandler> {
        Arc::new(self)
    }
}

impl JobHandler for DataProcessor {
    fn name(&self) -> &str {
        "data-processor"
    }

    fn handle(&self, job: &Job) -> HandlerFuture {
        let delay = self.delay;
        let request = job.request.clone();
        Box::pin(async move {
            let simulate_failure = request
                .option("simulate_failure")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);

            tokio::time::sleep(delay).await;

            if simulate_failure {
                return Err(format!("Simulated failure while processing {}", request.data_path));
            }

            tracing::debug!("Processed {}", request.data_path);
            Ok(JobResult::with_output(
                format!("Processed {}", request.data_path),
                json!({
                    "data_path": request.data_path,
                    "output_path": request.output_path,
                }),
            ))
        })
    }
}
