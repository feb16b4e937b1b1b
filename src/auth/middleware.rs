use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    RequestPartsExt, TypedHeader,
};
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use super::jwt::{JwtKeys, Role};
use crate::routes::AppState;

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Caller identity on routes where authentication is optional
#[derive(Debug, Clone, Default)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: String,
    code: String,
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthErrorResponse {
            error: message.to_string(),
            code: "UNAUTHORIZED".to_string(),
        }),
    )
        .into_response()
}

fn authenticate(keys: &JwtKeys, token: &str) -> Result<AuthUser, &'static str> {
    let claims = keys.validate_token(token).map_err(|e| {
        error!("Token validation failed: {}", e);
        "Invalid token. Please login again"
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|e| {
        error!("User ID parsing failed: {:?}", e);
        "Invalid user identifier in token"
    })?;

    Ok(AuthUser {
        user_id,
        role: claims.role,
    })
}

/// Authentication middleware to protect routes
pub async fn auth_middleware<B>(
    State(state): State<AppState>,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, Response> {
    let (mut parts, body) = req.into_parts();

    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|e| {
            debug!("Authorization header extraction failed: {:?}", e);
            unauthorized("Missing or invalid Authorization header. Please provide a Bearer token")
        })?;

    let auth_user = authenticate(&state.jwt, bearer.token()).map_err(unauthorized)?;
    debug!(
        "User authenticated: {} with role {:?}",
        auth_user.user_id, auth_user.role
    );

    parts.extensions.insert(auth_user);

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Optional authentication middleware for public routes that need auth info
pub async fn optional_auth_middleware<B>(
    State(state): State<AppState>,
    req: Request<B>,
    next: Next<B>,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let auth_user = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => authenticate(&state.jwt, bearer.token()).ok(),
        Err(_) => None,
    };

    parts.extensions.insert(MaybeAuthUser(auth_user));

    let req = Request::from_parts(parts, body);
    next.run(req).await
}

/// Extractor for authenticated user
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| unauthorized("Authentication required"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<MaybeAuthUser>()
            .cloned()
            .unwrap_or_default())
    }
}
