use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use shared_models::error::AppError;

/// JSON body extractor that runs `validator` rules before the handler sees the value.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;

        value.validate().map_err(|errors| {
            debug!("Request body failed validation: {}", errors);
            AppError::ValidationError(errors.to_string())
        })?;

        Ok(ValidatedJson(value))
    }
}
