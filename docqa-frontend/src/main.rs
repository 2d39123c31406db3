use client_core::observability::init_tracing;
use docqa_frontend::config::get_configuration;
use docqa_frontend::startup::run;
use dotenvy::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "docqa-frontend",
        &configuration.logging.level,
        configuration.logging.otlp_endpoint.as_deref(),
        configuration.logging.json,
    );

    docqa_frontend::services::metrics::init_metrics();

    info!(backend = %configuration.backend.url, "Starting docqa");
    run(configuration).await
}
