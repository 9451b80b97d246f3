//! Worker service binary for the Lattice simulation.
//!
//! Connects to NATS and serves the five controller operations until a
//! shutdown control request arrives. The worker owns the authoritative
//! world for the duration of a run; a controller detach leaves it running.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Read the NATS URL from the environment (`NATS_URL`)
//! 3. Connect and subscribe to the `lattice.*` subjects
//! 4. Serve requests until shut down

use tracing::info;
use tracing_subscriber::EnvFilter;

use lattice_worker::WorkerService;

/// Application entry point for the worker service.
///
/// # Errors
///
/// Returns an error if the NATS connection or subscription fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("lattice-worker starting");

    // 2. Read infrastructure settings from the environment.
    let nats_url =
        std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_owned());
    info!(nats_url = nats_url, "configuration loaded");

    // 3. Connect and serve.
    let service = WorkerService::connect(&nats_url).await?;
    service.run().await?;

    info!("lattice-worker shutdown complete");
    Ok(())
}
