use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use super::service::{self, AuthError, AuthResult, LoginData, RegisterData};
use crate::account::model::UserProfileResponse;
use crate::controller::{error_response, ApiJson};
use crate::routes::AppState;

// Request DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
    pub password: String,
}

// Response DTOs
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserProfileResponse,
    pub token: String,
    #[schema(example = "Login successful")]
    pub message: String,
}

fn to_response(result: AuthResult, message: &str) -> AuthResponse {
    AuthResponse {
        user: result.user,
        token: result.token,
        message: message.to_string(),
    }
}

// Convert AuthError to Response
fn handle_error(err: AuthError) -> Response {
    let status = err.status_code();

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Internal server error: {}", err);
    } else {
        info!("Auth error: {} ({})", err, status);
    }

    error_response(status, err.message(), err.code()).into_response()
}

// Controller for user registration
#[utoipa::path(
    post,
    path = "/api/accounts/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input or duplicate user", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Response {
    info!("Registration request received for username: {}", req.username);

    let data = RegisterData {
        username: req.username,
        email: req.email,
        password: req.password,
        password_confirm: req.password_confirm,
        bio: req.bio,
    };

    match service::register(state.store.as_ref(), &state.jwt, data).await {
        Ok(result) => {
            let response = to_response(result, "User registered successfully");
            info!("User registered successfully: {}", response.user.id);
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => handle_error(err),
    }
}

// Controller for user login
#[utoipa::path(
    post,
    path = "/api/accounts/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing credentials", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Response {
    info!("Login request received for username: {}", req.username);

    if req.username.trim().is_empty() || req.password.is_empty() {
        return handle_error(AuthError::InvalidInput(
            "Username and password are required".to_string(),
        ));
    }

    let data = LoginData {
        username: req.username,
        password: req.password,
    };

    match service::login(state.store.as_ref(), &state.jwt, data).await {
        Ok(result) => {
            let response = to_response(result, "Login successful");
            info!("User login successful: {}", response.user.id);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => handle_error(err),
    }
}
