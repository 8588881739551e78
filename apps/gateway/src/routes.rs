//! Gateway routes

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::any};
use axum_helpers::{health_router, with_common_layers};
use std::io;

use crate::logging::log_proxied_request;
use crate::proxy::{ProxyClient, forward};

/// - `GET /health` answered locally with `{"ok": true}`
/// - any method on `/api` and `/api/{*rest}` forwarded upstream
/// - everything else 404 `{"error": "Not found", ...}`
///
/// # Errors
/// Returns an error if `CORS_ALLOWED_ORIGIN` contains an invalid header value.
pub fn router(proxy: ProxyClient) -> io::Result<Router> {
    let max_body_bytes = proxy.max_body_bytes();

    let api = Router::new()
        .route("/api", any(forward))
        .route("/api/{*rest}", any(forward))
        .layer(middleware::from_fn(log_proxied_request))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(proxy);

    with_common_layers(Router::new().merge(health_router()).merge(api))
}
