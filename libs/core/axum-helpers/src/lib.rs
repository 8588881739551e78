//! # Axum Helpers
//!
//! Shared building blocks for the workspace's axum services.
//!
//! - **[`errors`]**: `AppError` → `{error, message}` JSON responses
//! - **[`extractors`]**: ObjectId path ids, lenient JSON bodies, query strings, validated JSON
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router assembly, health endpoints, graceful shutdown

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal, with_common_layers,
};

pub use http::{create_cors_layer, cors_layer_from_env, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{ObjectIdPath, Payload, QueryParams, ValidatedJson};
