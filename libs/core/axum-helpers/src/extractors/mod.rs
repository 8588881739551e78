//! Custom extractors for Axum handlers.
//!
//! Every rejection is an [`AppError`](crate::errors::AppError), so handlers
//! see the same `{error, message}` body whether extraction or the handler fails.

pub mod object_id_path;
pub mod payload;
pub mod query_params;
pub mod validated_json;

pub use object_id_path::ObjectIdPath;
pub use payload::Payload;
pub use query_params::QueryParams;
pub use validated_json::ValidatedJson;
