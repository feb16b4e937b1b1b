use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::auth::middleware::AuthUser;
use crate::controller::{internal_error, ApiQuery};
use crate::feed::model::{EmptyFeedResponse, Feed, FeedError, FeedResponse};
use crate::feed::service::FeedService;
use crate::pagination::{PageParams, PageRequest};
use crate::post::model::POSTS_PER_PAGE;
use crate::routes::AppState;

/// Home feed
///
/// Posts by the accounts the caller follows, newest first. When the caller
/// follows nobody the body is an `EmptyFeedResponse` instead.
#[utoipa::path(
    get,
    path = "/api/feed",
    tag = "feed",
    params(PageParams),
    responses(
        (status = 200, description = "Feed page, or an EmptyFeedResponse when following nobody", body = FeedResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_feed(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Response {
    let page = PageRequest::from_params(&params, POSTS_PER_PAGE);
    info!("Building feed page {} for user {}", page.page, user.user_id);

    match FeedService::new(state.store.clone())
        .get_feed(user.user_id, page)
        .await
    {
        Ok(Feed::Posts(feed)) => (StatusCode::OK, Json::<FeedResponse>(feed)).into_response(),
        Ok(Feed::NotFollowingAnyone(empty)) => {
            (StatusCode::OK, Json::<EmptyFeedResponse>(empty)).into_response()
        }
        Err(FeedError::Store(e)) => internal_error("Feed store error", &e).into_response(),
    }
}
