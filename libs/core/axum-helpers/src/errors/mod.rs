pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body returned for every error response.
///
/// - `error`: short label from [`ErrorCode::as_str`] (e.g. `"Not found"`)
/// - `message`: human-readable explanation
/// - `details`: optional field-level information (validation failures)
///
/// ```json
/// {
///   "error": "Insufficient stock",
///   "message": "Requested 51 but only 50 in stock"
/// }
/// ```
///
/// The bad-gateway fallback carries `error` only.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: code.as_str().to_string(),
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Detail is logged; clients get a generic message
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Gateway Timeout: {0}")]
    GatewayTimeout(String),

    /// Rendered as `{ "error": "Bad gateway" }` without a message
    #[error("Bad Gateway: {0}")]
    BadGateway(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::BadRequest(_) | AppError::ValidationError(_) => ErrorCode::InvalidInput,
            AppError::InvalidId(_) => ErrorCode::InvalidId,
            AppError::InvalidJson(_) => ErrorCode::InvalidJson,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::InsufficientStock(_) => ErrorCode::InsufficientStock,
            AppError::PayloadTooLarge(_) => ErrorCode::PayloadTooLarge,
            AppError::InternalServerError(_) => ErrorCode::InternalError,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::ServiceUnavailable(_) => ErrorCode::UpstreamUnavailable,
            AppError::GatewayTimeout(_) => ErrorCode::UpstreamTimeout,
            AppError::BadGateway(_) => ErrorCode::BadGateway,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code().status()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let body = match self {
            AppError::BadRequest(msg)
            | AppError::InvalidId(msg)
            | AppError::InvalidJson(msg)
            | AppError::NotFound(msg)
            | AppError::InsufficientStock(msg)
            | AppError::PayloadTooLarge(msg) => {
                tracing::info!(error_code = code.code(), "{}: {}", code, msg);
                ErrorResponse::new(code, msg)
            }
            AppError::ValidationError(e) => {
                tracing::info!(error_code = code.code(), "Validation error: {:?}", e);
                ErrorResponse::new(code, validation_message(&e))
                    .with_details(validation_details(&e))
            }
            AppError::InternalServerError(detail) | AppError::Database(detail) => {
                tracing::error!(error_code = code.code(), "{}: {}", code, detail);
                ErrorResponse::new(code, code.default_message())
            }
            AppError::ServiceUnavailable(detail) | AppError::GatewayTimeout(detail) => {
                tracing::warn!(error_code = code.code(), "{}: {}", code, detail);
                ErrorResponse::new(code, code.default_message())
            }
            AppError::BadGateway(detail) => {
                tracing::error!(error_code = code.code(), "Bad gateway: {}", detail);
                ErrorResponse {
                    error: code.as_str().to_string(),
                    message: None,
                    details: None,
                }
            }
        };

        (code.status(), Json(body)).into_response()
    }
}

/// First field message, e.g. `"quantity: must be a positive number"`.
fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .first()
        .and_then(|(field, errs)| {
            errs.first().map(|err| match &err.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: invalid value ({})", field, err.code),
            })
        })
        .unwrap_or_else(|| ErrorCode::InvalidInput.default_message().to_string())
}

/// Field name → list of `{code, message, params}` objects.
fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let details = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let list: Vec<serde_json::Value> = errs
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), serde_json::Value::Array(list))
        })
        .collect::<serde_json::Map<_, _>>();

    serde_json::Value::Object(details)
}

/// Build an error response from a code and message without going through [`AppError`].
pub fn error_response(error_code: ErrorCode, message: impl Into<String>) -> Response {
    (error_code.status(), Json(ErrorResponse::new(error_code, message))).into_response()
}
