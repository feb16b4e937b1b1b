use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::controller::{error_response, internal_error, ApiError, ApiPath};
use crate::follow::model::{FollowError, FollowStateResponse, FollowersResponse, FollowingResponse};
use crate::follow::service::FollowService;
use crate::routes::AppState;

fn follow_error_to_response(err: FollowError) -> ApiError {
    match err {
        FollowError::Store(e) => internal_error("Follow store error", &e),
        FollowError::SelfFollow => error_response(
            StatusCode::BAD_REQUEST,
            "You cannot follow yourself",
            "SELF_FOLLOW",
        ),
        FollowError::UserNotFound => {
            error_response(StatusCode::NOT_FOUND, "User not found", "USER_NOT_FOUND")
        }
        e @ FollowError::AlreadyFollowing(_) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string(), "ALREADY_FOLLOWING")
        }
        e @ FollowError::NotFollowing(_) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string(), "NOT_FOLLOWING")
        }
    }
}

fn service(state: &AppState) -> FollowService {
    FollowService::new(state.store.clone(), state.notifications())
}

/// Follow a user
#[utoipa::path(
    post,
    path = "/api/accounts/follow/{user_id}",
    tag = "follows",
    params(
        ("user_id" = String, Path, description = "User to follow")
    ),
    responses(
        (status = 200, description = "Now following", body = FollowStateResponse),
        (status = 400, description = "Self follow or already following", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn follow_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(target): ApiPath<Uuid>,
) -> Result<Json<FollowStateResponse>, ApiError> {
    info!("User {} wants to follow {}", user.user_id, target);
    service(&state)
        .follow(user.user_id, target)
        .await
        .map(Json)
        .map_err(follow_error_to_response)
}

/// Stop following a user
#[utoipa::path(
    post,
    path = "/api/accounts/unfollow/{user_id}",
    tag = "follows",
    params(
        ("user_id" = String, Path, description = "User to unfollow")
    ),
    responses(
        (status = 200, description = "No longer following", body = FollowStateResponse),
        (status = 400, description = "Not following", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unfollow_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(target): ApiPath<Uuid>,
) -> Result<Json<FollowStateResponse>, ApiError> {
    info!("User {} wants to unfollow {}", user.user_id, target);
    service(&state)
        .unfollow(user.user_id, target)
        .await
        .map(Json)
        .map_err(follow_error_to_response)
}

/// Followers of the caller
#[utoipa::path(
    get,
    path = "/api/accounts/followers",
    tag = "follows",
    responses(
        (status = 200, description = "Followers", body = FollowersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_followers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<FollowersResponse>, ApiError> {
    service(&state)
        .followers(user.user_id)
        .await
        .map(Json)
        .map_err(follow_error_to_response)
}

/// Followers of any user
#[utoipa::path(
    get,
    path = "/api/accounts/followers/{user_id}",
    tag = "follows",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Followers", body = FollowersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn user_followers(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<FollowersResponse>, ApiError> {
    service(&state)
        .followers(user_id)
        .await
        .map(Json)
        .map_err(follow_error_to_response)
}

/// Accounts the caller follows
#[utoipa::path(
    get,
    path = "/api/accounts/following",
    tag = "follows",
    responses(
        (status = 200, description = "Followed accounts", body = FollowingResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_following(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<FollowingResponse>, ApiError> {
    service(&state)
        .following(user.user_id)
        .await
        .map(Json)
        .map_err(follow_error_to_response)
}

/// Accounts any user follows
#[utoipa::path(
    get,
    path = "/api/accounts/following/{user_id}",
    tag = "follows",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Followed accounts", body = FollowingResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn user_following(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<FollowingResponse>, ApiError> {
    service(&state)
        .following(user_id)
        .await
        .map(Json)
        .map_err(follow_error_to_response)
}
