//! API routes module

pub mod health;
pub mod products;

use axum::Router;
use axum_helpers::health_router;

use crate::state::AppState;

/// Routes mounted under `/api`.
///
/// `/api/health` is the liveness answer clients reach through the gateway.
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .merge(health_router())
        .nest("/products", products::router(state))
}

/// Initialize database indexes
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    products::init_indexes(state).await
}
