mod config;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use config::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let (state, pool) = api::init_job_service(cli.service_config()).await?;

    let listener = TcpListener::bind(cli.bind_addr()).await?;
    api::serve(listener, state).await?;

    // Running jobs finish before the pool exits.
    pool.await?;
    tracing::info!("Server stopped");
    Ok(())
}
