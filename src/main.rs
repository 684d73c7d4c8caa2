use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ehr_core::{seed, ClinicalService, CoreConfig};

/// Main entry point for the EHR application
///
/// Loads `.env`, resolves configuration once, builds the clinical service from the reference
/// range catalogue, optionally loads the sample data set, and serves the REST API.
///
/// # Environment Variables
/// - `EHR_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `EHR_REFERENCE_RANGES`: Reference range YAML file (default: bundled catalogue)
/// - `EHR_SEED`: Load sample data into the empty store (default: true)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, start-up or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ehr=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env()?;
    let catalogue = cfg.load_catalogue()?;
    let service = ClinicalService::with_catalogue(&catalogue)?;

    if cfg.seed_on_start() {
        match seed::populate(&service)? {
            Some(summary) => tracing::info!("++ Sample data loaded: {:?}", summary),
            None => tracing::info!("++ Store not empty, sample data skipped"),
        }
    }

    let rest_addr = cfg.rest_addr();
    tracing::info!("++ Starting EHR REST on {}", rest_addr);
    tracing::info!("++ Swagger UI at http://{}/swagger-ui/", rest_addr);

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, api_rest::router(service)).await?;

    Ok(())
}
