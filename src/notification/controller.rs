use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::auth::middleware::AuthUser;
use crate::controller::{error_response, internal_error, ApiError, ApiPath, ApiQuery};
use crate::notification::model::{
    MarkAllReadResponse, MarkReadResponse, NotificationError, NotificationListResponse,
    NOTIFICATIONS_PER_PAGE,
};
use crate::pagination::{PageParams, PageRequest};
use crate::routes::AppState;

fn notification_error_to_response(err: NotificationError) -> ApiError {
    match err {
        NotificationError::NotFound => error_response(
            StatusCode::NOT_FOUND,
            "Notification not found",
            "NOT_FOUND",
        ),
        other => internal_error("Notification error", &other),
    }
}

/// Notifications of the caller, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    params(PageParams),
    responses(
        (status = 200, description = "A page of notifications", body = NotificationListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let page = PageRequest::from_params(&params, NOTIFICATIONS_PER_PAGE);
    state
        .notifications()
        .list(user.user_id, page)
        .await
        .map(Json)
        .map_err(notification_error_to_response)
}

/// Mark one notification as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/mark-read",
    tag = "notifications",
    params(
        ("id" = i64, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Marked as read", body = MarkReadResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "No such notification for this user", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    state
        .notifications()
        .mark_read(id, user.user_id)
        .await
        .map(Json)
        .map_err(notification_error_to_response)
}

/// Mark every unread notification as read
#[utoipa::path(
    patch,
    path = "/api/notifications/mark-all-read",
    tag = "notifications",
    responses(
        (status = 200, description = "Number of notifications updated", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    state
        .notifications()
        .mark_all_read(user.user_id)
        .await
        .map(Json)
        .map_err(notification_error_to_response)
}
