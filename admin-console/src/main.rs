use admin_console::config::get_configuration;
use admin_console::services::{metrics::init_metrics, ApiGateway};
use admin_console::startup::build_router;
use admin_console::session::{spawn_idle_sweeper, CredentialVault};
use admin_console::AppState;
use dotenvy::dotenv;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "admin-console",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    );

    init_metrics().map_err(|e| anyhow::anyhow!("Failed to register metrics: {}", e))?;

    let gateway = ApiGateway::new(configuration.api.clone())
        .map_err(|e| anyhow::anyhow!("Failed to build API client: {}", e))?;
    info!(api = %configuration.api.base_url, "Using sports API");

    let vault = CredentialVault::new(configuration.server.session_idle());
    spawn_idle_sweeper(vault.clone(), Duration::from_secs(300));

    let app = build_router(
        AppState::new(Arc::new(gateway), vault),
        &configuration.server,
    );

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting admin-console on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
