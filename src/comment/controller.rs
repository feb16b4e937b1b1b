use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::auth::middleware::AuthUser;
use crate::auth::permissions::Denied;
use crate::comment::model::{
    CommentError, CommentListParams, CommentResponse, CommentsListResponse, CreateCommentRequest,
    UpdateCommentRequest,
};
use crate::comment::service::CommentService;
use crate::controller::{
    denied_response, error_response, internal_error, ApiError, ApiJson, ApiPath, ApiQuery,
};
use crate::pagination::PageParams;
use crate::routes::AppState;

// Helper function to convert CommentError to HTTP response
fn comment_error_to_response(err: CommentError) -> ApiError {
    match err {
        CommentError::Store(e) => internal_error("Comment store error", &e),
        CommentError::NotFound => {
            error_response(StatusCode::NOT_FOUND, "Comment not found", "NOT_FOUND")
        }
        CommentError::PostNotFound => {
            error_response(StatusCode::NOT_FOUND, "Post not found", "POST_NOT_FOUND")
        }
        CommentError::Unauthenticated => denied_response(Denied::Unauthenticated),
        CommentError::Forbidden(reason) => denied_response(Denied::Forbidden(reason)),
        CommentError::ValidationError(message) => {
            error_response(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
        }
    }
}

fn service(state: &AppState) -> CommentService {
    CommentService::new(state.store.clone(), state.notifications())
}

/// List comments
///
/// Comments are returned oldest first and can be filtered by post, author and content.
#[utoipa::path(
    get,
    path = "/api/comments",
    tag = "comments",
    params(CommentListParams),
    responses(
        (status = 200, description = "A page of comments", body = CommentsListResponse)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CommentListParams>,
) -> Result<Json<CommentsListResponse>, ApiError> {
    service(&state)
        .list_comments(params)
        .await
        .map(Json)
        .map_err(comment_error_to_response)
}

/// Create a comment on a post
///
/// The post author is notified unless they comment on their own post.
#[utoipa::path(
    post,
    path = "/api/comments",
    tag = "comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created successfully", body = CommentResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> Response {
    info!(
        "Creating comment for post: {}, user: {}",
        request.post, user.user_id
    );
    match service(&state).create_comment(user.user_id, request).await {
        Ok(comment) => {
            info!("Successfully created comment with ID: {}", comment.id);
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(e) => comment_error_to_response(e).into_response(),
    }
}

/// Get a comment by ID
#[utoipa::path(
    get,
    path = "/api/comments/{id}",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment found", body = CommentResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    )
)]
pub async fn get_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CommentResponse>, ApiError> {
    service(&state)
        .get_comment(id)
        .await
        .map(Json)
        .map_err(comment_error_to_response)
}

/// Get comments for a post
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "The ID of the post to get comments for"),
        PageParams
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = CommentsListResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
pub async fn get_post_comments(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<CommentsListResponse>, ApiError> {
    info!("Getting comments for post: {}", post_id);
    service(&state)
        .list_post_comments(post_id, &params)
        .await
        .map(Json)
        .map_err(comment_error_to_response)
}

/// Edit a comment
#[utoipa::path(
    patch,
    path = "/api/comments/{id}",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "Comment ID")
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    service(&state)
        .update_comment(id, &user, request.content)
        .await
        .map(Json)
        .map_err(comment_error_to_response)
}

/// Delete a comment
///
/// This endpoint allows users to delete their own comments or admins to delete any comment.
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "The ID of the comment to delete")
    ),
    responses(
        (status = 204, description = "Comment deleted successfully"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Response {
    info!(
        "Deleting comment: {}, requested by user: {}",
        id, user.user_id
    );
    match service(&state).delete_comment(id, &user).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => comment_error_to_response(e).into_response(),
    }
}
