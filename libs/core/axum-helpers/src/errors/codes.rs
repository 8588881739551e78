//! Error codes shared by every service in the workspace.
//!
//! Each code has:
//! - a short label sent to clients in the `error` field (e.g. `"Not found"`)
//! - an integer for structured logs (`error_code` field)
//! - an HTTP status and a default message
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::InsufficientStock;
//! assert_eq!(code.as_str(), "Insufficient stock");
//! assert_eq!(code.code(), 1005);
//! assert_eq!(code.status().as_u16(), 400);
//! ```

use axum::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000s)
    /// Missing, malformed or out-of-range request data
    InvalidInput,
    /// Path identifier is not a valid document id
    InvalidId,
    /// Request body is not valid JSON
    InvalidJson,
    NotFound,
    /// A guarded stock decrement found less stock than requested
    InsufficientStock,
    PayloadTooLarge,

    // Server errors (2000s)
    InternalError,
    /// Store-level failure; details are logged, never returned
    DatabaseError,

    // Upstream errors (3000s), raised by the gateway
    UpstreamUnavailable,
    UpstreamTimeout,
    BadGateway,
}

impl ErrorCode {
    /// Label for the `error` field of response bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput | Self::InvalidId | Self::InvalidJson => "Invalid input",
            Self::NotFound => "Not found",
            Self::InsufficientStock => "Insufficient stock",
            Self::PayloadTooLarge => "Payload too large",
            Self::InternalError | Self::DatabaseError => "Internal server error",
            Self::UpstreamUnavailable => "Backend service unavailable",
            Self::UpstreamTimeout => "Gateway timeout",
            Self::BadGateway => "Bad gateway",
        }
    }

    /// Integer code for logs and metrics
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidInput => 1001,
            Self::InvalidId => 1002,
            Self::InvalidJson => 1003,
            Self::NotFound => 1004,
            Self::InsufficientStock => 1005,
            Self::PayloadTooLarge => 1006,
            Self::InternalError => 2001,
            Self::DatabaseError => 2002,
            Self::UpstreamUnavailable => 3001,
            Self::UpstreamTimeout => 3002,
            Self::BadGateway => 3003,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::InvalidId | Self::InvalidJson | Self::InsufficientStock => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Request validation failed",
            Self::InvalidId => "Invalid ID format",
            Self::InvalidJson => "Request body is not valid JSON",
            Self::NotFound => "Resource not found",
            Self::InsufficientStock => "Insufficient stock for this operation",
            Self::PayloadTooLarge => "Request body exceeds the size limit",
            Self::InternalError | Self::DatabaseError => "An unexpected error occurred",
            Self::UpstreamUnavailable => "Could not connect to the backend service",
            Self::UpstreamTimeout => "The backend service did not respond in time",
            Self::BadGateway => "Invalid response from the backend service",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_codes_share_label() {
        assert_eq!(ErrorCode::InvalidInput.as_str(), "Invalid input");
        assert_eq!(ErrorCode::InvalidId.as_str(), "Invalid input");
        assert_eq!(ErrorCode::InvalidJson.as_str(), "Invalid input");
    }

    #[test]
    fn test_upstream_statuses() {
        assert_eq!(ErrorCode::UpstreamUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ErrorCode::BadGateway.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::UpstreamUnavailable.as_str(),
            "Backend service unavailable"
        );
    }

    #[test]
    fn test_integer_codes_are_unique() {
        let all = [
            ErrorCode::InvalidInput,
            ErrorCode::InvalidId,
            ErrorCode::InvalidJson,
            ErrorCode::NotFound,
            ErrorCode::InsufficientStock,
            ErrorCode::PayloadTooLarge,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::UpstreamUnavailable,
            ErrorCode::UpstreamTimeout,
            ErrorCode::BadGateway,
        ];
        let mut codes: Vec<i32> = all.iter().map(ErrorCode::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
    }
}
