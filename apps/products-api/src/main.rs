//! Products API - REST server over MongoDB

use axum::{middleware, routing::get};
use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use observability::{init_metrics, metrics_handler, metrics_middleware};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    init_metrics()?;

    info!(
        service = config.app.name,
        version = config.app.version,
        "Connecting to MongoDB at {}",
        config.mongodb.url()
    );

    // Connect to MongoDB
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;

    let db = mongo_client.database(config.mongodb.database());

    info!(
        "Successfully connected to MongoDB database: {}",
        config.mongodb.database()
    );

    // Initialize the application state
    let state = AppState {
        config: config.clone(),
        mongo_client,
        db,
    };

    // Initialize indexes
    api::init_indexes(&state).await?;

    // Build REST router
    let api_routes = api::routes(&state);
    let app = axum_helpers::create_router::<openapi::ApiDoc>(api_routes)?
        .merge(health_router())
        .merge(api::health::router(state.clone()))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware));

    info!(
        "Starting Products API on port {} (collection: {})",
        state.config.server.port, state.config.products_collection
    );

    // Run REST server with graceful shutdown
    let client = state.mongo_client.clone();
    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing MongoDB connections");
            client.shutdown().await;
            info!("MongoDB connection closed");
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
