use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the bearer JWT scheme referenced by protected paths
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social Graph Backend API",
        version = "0.1.0",
        description = "Accounts, follow graph, home feed, posts, comments, likes and notifications"
    ),
    paths(
        crate::routes::health::health_check,
        // Accounts
        crate::auth::controller::register,
        crate::auth::controller::login,
        crate::account::controller::get_profile,
        crate::account::controller::update_profile,
        crate::account::controller::delete_profile,
        crate::account::controller::get_user,
        // Follow graph
        crate::follow::controller::follow_user,
        crate::follow::controller::unfollow_user,
        crate::follow::controller::my_followers,
        crate::follow::controller::user_followers,
        crate::follow::controller::my_following,
        crate::follow::controller::user_following,
        // Feed
        crate::feed::controller::get_feed,
        // Posts
        crate::post::controller::list_posts,
        crate::post::controller::create_post,
        crate::post::controller::get_post,
        crate::post::controller::update_post,
        crate::post::controller::delete_post,
        crate::post::controller::like_post,
        crate::post::controller::unlike_post,
        // Comments
        crate::comment::controller::list_comments,
        crate::comment::controller::create_comment,
        crate::comment::controller::get_comment,
        crate::comment::controller::get_post_comments,
        crate::comment::controller::update_comment,
        crate::comment::controller::delete_comment,
        // Notifications
        crate::notification::controller::list_notifications,
        crate::notification::controller::mark_read,
        crate::notification::controller::mark_all_read
    ),
    components(
        schemas(
            crate::controller::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::auth::jwt::Role,
            crate::auth::controller::RegisterRequest,
            crate::auth::controller::LoginRequest,
            crate::auth::controller::AuthResponse,
            crate::account::model::UserBrief,
            crate::account::model::UserProfileResponse,
            crate::account::model::PublicProfileResponse,
            crate::account::model::UpdateProfileRequest,
            crate::follow::model::FollowStateResponse,
            crate::follow::model::FollowersResponse,
            crate::follow::model::FollowingResponse,
            crate::feed::model::FeedResponse,
            crate::feed::model::EmptyFeedResponse,
            crate::post::model::CreatePostRequest,
            crate::post::model::UpdatePostRequest,
            crate::post::model::PostResponse,
            crate::post::model::PostListResponse,
            crate::post::model::LikeResponse,
            crate::post::model::LikeErrorResponse,
            crate::comment::model::CreateCommentRequest,
            crate::comment::model::UpdateCommentRequest,
            crate::comment::model::CommentResponse,
            crate::comment::model::CommentsListResponse,
            crate::notification::model::Verb,
            crate::notification::model::NotificationResponse,
            crate::notification::model::NotificationListResponse,
            crate::notification::model::MarkReadResponse,
            crate::notification::model::MarkAllReadResponse,
            crate::schema_ext::DateTimeWrapper,
            crate::schema_ext::UuidWrapper
        )
    ),
    tags(
        (name = "health", description = "Liveness and dependency status"),
        (name = "accounts", description = "Registration, login and profiles"),
        (name = "follows", description = "Follow graph"),
        (name = "feed", description = "Home feed of followed accounts"),
        (name = "posts", description = "Posts"),
        (name = "likes", description = "Liking and unliking posts"),
        (name = "comments", description = "Comments on posts"),
        (name = "notifications", description = "Notification inbox")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/feed",
            "/api/accounts/follow/{user_id}",
            "/api/posts/{id}/like",
            "/api/notifications/mark-all-read",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
