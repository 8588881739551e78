//! Lenient JSON body extractor.

use crate::errors::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// JSON body extractor that never answers 415 or 422.
///
/// - the `Content-Type` header is not checked
/// - an empty (or whitespace-only) body is read as `{}`
/// - syntax and type errors are reported as 400 `Invalid input`
///
/// ```ignore
/// async fn create(Payload(body): Payload<serde_json::Map<String, Value>>) { /* ... */ }
/// ```
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge(e.body_text())
            } else {
                AppError::BadRequest(e.body_text())
            }
        })?;

        parse_body(&bytes).map(Payload)
    }
}

/// Deserialize a request body, treating an empty body as `{}`.
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let trimmed = bytes.trim_ascii();
    let source: &[u8] = if trimmed.is_empty() { b"{}" } else { trimmed };

    serde_json::from_slice(source).map_err(|e| {
        if e.is_syntax() || e.is_eof() {
            AppError::InvalidJson(format!("Malformed JSON body: {}", e))
        } else {
            AppError::BadRequest(format!("Invalid request body: {}", e))
        }
    })
}
