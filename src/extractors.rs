use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::auth::bearer::caller_from_headers;
use crate::auth::Caller;
use crate::error::AppError;

/// Extractor that requires an `Authorization: Bearer <user id>` header.
/// Returns 401 when the header is missing or malformed.
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = caller_from_headers(&parts.headers)?;
        tracing::trace!("Request from {}", caller);
        Ok(caller)
    }
}

/// JSON body extractor whose rejection is an `AppError::BadRequest`, so
/// malformed bodies get the same `{ "message" }` shape as every other error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(bad_body(rejection)),
        }
    }
}

fn bad_body(rejection: JsonRejection) -> AppError {
    tracing::debug!("Rejected request body: {}", rejection.body_text());
    AppError::BadRequest(rejection.body_text())
}
