use axum::response::Response;

use super::{ErrorCode, error_response};

/// Fallback handler for unmatched routes.
pub async fn not_found() -> Response {
    error_response(ErrorCode::NotFound, "The requested resource was not found")
}
