//! Job handler trait: the unit of work executed for each job.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use job_core::{Job, JobResult};

/// Result type for job handlers.
pub type HandlerResult = Result<JobResult, String>;

/// Future type for async job handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Trait for job handlers.
///
/// Implement this trait to define how a submitted job is processed. The
/// handler only sees a copy of the job; status bookkeeping is done by the
/// worker that runs it.
pub trait JobHandler: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Process a job and return the result.
    fn handle(&self, job: &Job) -> HandlerFuture;
}

/// A simple function-based job handler.
pub struct FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    name: String,
    handler: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    /// Create a new function-based handler.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    /// Wrap the handler for sharing across workers.
    pub fn shared(self) -> Arc<dyn JobHandler> {
        Arc::new(self)
    }
}

impl<F> JobHandler for FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, job: &Job) -> HandlerFuture {
        (self.handler)(job)
    }
}

/// Helper macro for creating job handlers from async blocks.
#[macro_export]
macro_rules! job_handler {
    ($name:expr, |$job:ident| $body:expr) => {
        $crate::FnHandler::new($name, |$job: &$crate::Job| {
            let $job = $job.clone();
            Box::pin(async move { $body })
        })
    };
}

/// Run a handler, turning panics and timeouts into failures.
pub(crate) async fn run_guarded(
    handler: &dyn JobHandler,
    job: &Job,
    timeout: Option<Duration>,
) -> HandlerResult {
    let work = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(job))) {
        Ok(work) => AssertUnwindSafe(work).catch_unwind(),
        Err(panic) => return Err(panic_message(panic)),
    };

    let caught = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(caught) => caught,
            Err(_) => return Err(format!("job timed out after {:?}", limit)),
        },
        None => work.await,
    };

    caught.unwrap_or_else(|panic| Err(panic_message(panic)))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("job panicked: {}", detail)
}
