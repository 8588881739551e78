//! Gateway - single public entry point for the products backend

use axum_helpers::server::create_production_app;
use core_config::tracing::{init_tracing, install_color_eyre};
use gateway::{Config, ProxyClient, routes};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let proxy = ProxyClient::new(&config.upstream)?;
    let app = routes::router(proxy)?;

    info!(
        service = config.app.name,
        version = config.app.version,
        backend_url = %config.upstream.backend_url,
        timeout_secs = config.upstream.timeout.as_secs(),
        "Starting gateway on port {}",
        config.server.port
    );

    create_production_app(app, &config.server, Duration::from_secs(30), async {
        info!("Gateway holds no connections to release");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Gateway shutdown complete");
    Ok(())
}
