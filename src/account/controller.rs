use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::account::model::{
    AccountError, PublicProfileResponse, UpdateProfileRequest, UserProfileResponse,
};
use crate::account::service::AccountService;
use crate::auth::middleware::AuthUser;
use crate::controller::{error_response, internal_error, ApiError, ApiJson, ApiPath};
use crate::routes::AppState;

pub(crate) fn account_error_to_response(err: AccountError) -> ApiError {
    match err {
        AccountError::Store(e) => internal_error("Account store error", &e),
        AccountError::NotFound => {
            error_response(StatusCode::NOT_FOUND, "User not found", "USER_NOT_FOUND")
        }
        AccountError::Validation(message) => {
            error_response(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
        }
        AccountError::EmailTaken => error_response(
            StatusCode::BAD_REQUEST,
            "A user with this email already exists",
            "EMAIL_TAKEN",
        ),
    }
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/accounts/profile",
    tag = "accounts",
    responses(
        (status = 200, description = "Current profile", body = UserProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfileResponse>, ApiError> {
    AccountService::new(state.store.clone())
        .profile(user.user_id)
        .await
        .map(Json)
        .map_err(account_error_to_response)
}

/// Update bio and/or email of the authenticated user
#[utoipa::path(
    patch,
    path = "/api/accounts/profile",
    tag = "accounts",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserProfileResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    info!("Profile update requested by {}", user.user_id);
    AccountService::new(state.store.clone())
        .update_profile(user.user_id, request)
        .await
        .map(Json)
        .map_err(account_error_to_response)
}

/// Delete the authenticated user together with everything they own
#[utoipa::path(
    delete,
    path = "/api/accounts/profile",
    tag = "accounts",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_profile(State(state): State<AppState>, user: AuthUser) -> Response {
    info!("Account deletion requested by {}", user.user_id);
    match AccountService::new(state.store.clone())
        .delete_account(user.user_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => account_error_to_response(e).into_response(),
    }
}

/// Public profile of any user
#[utoipa::path(
    get,
    path = "/api/accounts/users/{user_id}",
    tag = "accounts",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Public profile", body = PublicProfileResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<PublicProfileResponse>, ApiError> {
    AccountService::new(state.store.clone())
        .public_profile(user_id)
        .await
        .map(Json)
        .map_err(account_error_to_response)
}
