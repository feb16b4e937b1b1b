use axum::{
    async_trait,
    body::HttpBody,
    extract::{FromRequest, FromRequestParts, Path, Query},
    http::{request::Parts, Request, StatusCode},
    BoxError, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Display;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::permissions::Denied;

/// Error body shared by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Post not found")]
    pub error: String,
    #[schema(example = "NOT_FOUND")]
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// Logs the cause and answers with an opaque 500
pub fn internal_error(context: &str, cause: &dyn Display) -> ApiError {
    error!("{}: {}", context, cause);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        "INTERNAL_ERROR",
    )
}

pub fn denied_response(denied: Denied) -> ApiError {
    match denied {
        Denied::Unauthenticated => error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication required",
            "UNAUTHORIZED",
        ),
        Denied::Forbidden(reason) => error_response(StatusCode::FORBIDDEN, reason, "FORBIDDEN"),
    }
}

fn rejected(message: String) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
}

/// `Json` body whose rejection uses the shared error body
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ApiJson(value))
            .map_err(|rejection| rejected(rejection.body_text()))
    }
}

/// `Path` parameters whose rejection uses the shared error body
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection| rejected(rejection.body_text()))
    }
}

/// `Query` string whose rejection uses the shared error body
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| rejected(rejection.body_text()))
    }
}
