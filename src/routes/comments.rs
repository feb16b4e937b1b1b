use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use super::AppState;
use crate::auth::middleware::{auth_middleware, optional_auth_middleware};
use crate::comment::controller;

pub fn routes(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/api/comments", get(controller::list_comments))
        .route("/api/comments/:id", get(controller::get_comment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let private_routes = Router::new()
        .route("/api/comments", post(controller::create_comment))
        .route(
            "/api/comments/:id",
            patch(controller::update_comment).delete(controller::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public_routes.merge(private_routes)
}
