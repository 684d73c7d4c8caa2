//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `ehr-run` binary does the same
//! work and additionally loads `.env`.

use api_rest::ehr_core::{seed, ClinicalService, CoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the EHR REST API server
///
/// # Environment Variables
/// - `EHR_REST_ADDR`: Server address (default: "0.0.0.0:8000")
/// - `EHR_REFERENCE_RANGES`: Optional reference range YAML file
/// - `EHR_SEED`: Load sample data into the empty store (default: true)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration or the reference range catalogue is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("ehr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env()?;
    let catalogue = cfg.load_catalogue()?;
    let service = ClinicalService::with_catalogue(&catalogue)?;
    if cfg.seed_on_start() {
        seed::populate(&service)?;
    }

    let addr = cfg.rest_addr();
    tracing::info!("-- Starting EHR REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, api_rest::router(service)).await?;

    Ok(())
}
