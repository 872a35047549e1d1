use axum::{
    extract::{FromRequest, OptionalFromRequest, Request},
    http::header,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// `Json` whose rejections use the API's error body.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Absent when the request carries no `Content-Type`, i.e. no body was sent.
impl<T, S> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        if !req.headers().contains_key(header::CONTENT_TYPE) {
            return Ok(None);
        }
        let ApiJson(value) = <ApiJson<T> as FromRequest<S>>::from_request(req, state).await?;
        Ok(Some(ApiJson(value)))
    }
}
