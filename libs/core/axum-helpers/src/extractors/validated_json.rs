//! JSON extractor with automatic validation using the validator crate.

use super::payload::Payload;
use crate::errors::AppError;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// [`Payload`] followed by `Validate::validate`.
///
/// Validation failures become 400 `Invalid input` with per-field `details`.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct StockUpdate {
///     #[validate(required, range(exclusive_min = 0.0))]
///     quantity: Option<f64>,
/// }
///
/// async fn update_stock(ValidatedJson(body): ValidatedJson<StockUpdate>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Payload(data) = Payload::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}
