//! Service initialization.

use std::sync::Arc;
use std::time::Duration;

use actors::{JobHandler, JobRegistry, LifecycleError, LifecycleManager};
use job_core::PoolConfig;
use tokio::task::JoinHandle;

use crate::processor::DataProcessor;
use crate::realtime::spawn_event_log;

/// Settings for one service instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Name reported by `GET /`.
    pub name: String,
    /// Simulated work per job for the built-in processor.
    pub processing_delay_ms: u64,
    pub pool: PoolConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "Job Processing API".to_string(),
            processing_delay_ms: 2000,
            pool: PoolConfig::default(),
        }
    }
}

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub lifecycle: LifecycleManager,
    /// Handler every submitted job runs with.
    pub processor: Arc<dyn JobHandler>,
    pub service_name: Arc<str>,
}

impl AppState {
    pub fn new(
        lifecycle: LifecycleManager,
        processor: Arc<dyn JobHandler>,
        service_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            registry: lifecycle.registry().clone(),
            lifecycle,
            processor,
            service_name: service_name.into(),
        }
    }
}

/// Start the registry, worker pool and event log.
///
/// Call once at startup; the returned handle resolves when the pool has
/// fully stopped.
pub async fn init_job_service(
    config: ServiceConfig,
) -> Result<(AppState, JoinHandle<()>), LifecycleError> {
    tracing::info!("Initializing job service...");

    let registry = Arc::new(JobRegistry::new());
    let (lifecycle, handle) = LifecycleManager::start(registry.clone(), config.pool).await?;
    spawn_event_log(&registry);

    let processor =
        DataProcessor::new(Duration::from_millis(config.processing_delay_ms)).shared();

    tracing::info!("Job service initialized");
    Ok((AppState::new(lifecycle, processor, config.name), handle))
}
