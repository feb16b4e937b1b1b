use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use super::AppState;
use crate::auth::middleware::{auth_middleware, optional_auth_middleware};
use crate::comment::controller as comment;
use crate::post::controller;

pub fn routes(state: AppState) -> Router<AppState> {
    // Reads resolve the viewer when a token is present so is_liked_by_user is accurate
    let public_routes = Router::new()
        .route("/api/posts", get(controller::list_posts))
        .route("/api/posts/:id", get(controller::get_post))
        .route("/api/posts/:id/comments", get(comment::get_post_comments))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let private_routes = Router::new()
        .route("/api/posts", post(controller::create_post))
        .route(
            "/api/posts/:id",
            patch(controller::update_post).delete(controller::delete_post),
        )
        .route(
            "/api/posts/:id/like",
            post(controller::like_post).delete(controller::unlike_post),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public_routes.merge(private_routes)
}
