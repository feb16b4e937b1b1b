use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::auth::middleware::{AuthUser, MaybeAuthUser};
use crate::auth::permissions::Denied;
use crate::controller::{
    denied_response, error_response, internal_error, ApiJson, ApiPath, ApiQuery,
};
use crate::post::model::{CreatePostRequest, LikeErrorResponse, PostListParams, UpdatePostRequest};
use crate::post::service::{LikeOutcome, PostError, PostService};
use crate::routes::AppState;

fn post_error_to_response(err: PostError) -> Response {
    match err {
        PostError::Store(e) => internal_error("Post store error", &e).into_response(),
        PostError::NotFound => {
            error_response(StatusCode::NOT_FOUND, "Post not found", "POST_NOT_FOUND")
                .into_response()
        }
        PostError::InvalidInput(message) => {
            error_response(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR").into_response()
        }
        PostError::Unauthenticated => denied_response(Denied::Unauthenticated).into_response(),
        PostError::Forbidden(reason) => denied_response(Denied::Forbidden(reason)).into_response(),
        PostError::NotLiked { likes_count } => (
            StatusCode::BAD_REQUEST,
            Json(LikeErrorResponse {
                error: "You have not liked this post".to_string(),
                code: "NOT_LIKED".to_string(),
                likes_count,
            }),
        )
            .into_response(),
    }
}

fn service(state: &AppState) -> PostService {
    PostService::new(state.store.clone(), state.notifications())
}

/// List posts
///
/// Supports filtering by author, free-text search and ordering.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(PostListParams),
    responses(
        (status = 200, description = "A page of posts", body = PostListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse)
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    ApiQuery(params): ApiQuery<PostListParams>,
) -> Response {
    match service(&state).list_posts(params, viewer.user_id()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => post_error_to_response(e),
    }
}

/// Create a new post
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created successfully", body = PostResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Response {
    info!("Creating post for user: {}", user.user_id);
    match service(&state).create_post(user.user_id, request).await {
        Ok(post) => (StatusCode::CREATED, Json(post)).into_response(),
        Err(e) => post_error_to_response(e),
    }
}

/// Get a post by ID
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Post found", body = PostResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    match service(&state).get_post(id, viewer.user_id()).await {
        Ok(post) => (StatusCode::OK, Json(post)).into_response(),
        Err(e) => post_error_to_response(e),
    }
}

/// Update a post
///
/// Only the author or an admin may edit a post.
#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post ID")
    ),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdatePostRequest>,
) -> Response {
    info!("Updating post {} for user: {}", id, user.user_id);
    match service(&state).update_post(id, &user, request).await {
        Ok(post) => (StatusCode::OK, Json(post)).into_response(),
        Err(e) => post_error_to_response(e),
    }
}

/// Delete a post
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post ID")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    info!("Deleting post {} for user: {}", id, user.user_id);
    match service(&state).delete_post(id, &user).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => post_error_to_response(e),
    }
}

/// Like a post
///
/// Liking twice is not an error; the second call reports the existing like.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    tag = "likes",
    params(
        ("id" = i64, Path, description = "Post ID")
    ),
    responses(
        (status = 201, description = "Post liked", body = LikeResponse),
        (status = 200, description = "Post was already liked", body = LikeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn like_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    match service(&state).like_post(user.user_id, id).await {
        Ok(LikeOutcome::Created(res)) => (StatusCode::CREATED, Json(res)).into_response(),
        Ok(LikeOutcome::AlreadyLiked(res)) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => post_error_to_response(e),
    }
}

/// Remove a like
#[utoipa::path(
    delete,
    path = "/api/posts/{id}/like",
    tag = "likes",
    params(
        ("id" = i64, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Post unliked", body = LikeResponse),
        (status = 400, description = "Post was not liked", body = LikeErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unlike_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    match service(&state).unlike_post(user.user_id, id).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => post_error_to_response(e),
    }
}
