use axum::{middleware, routing::get, Router};

use super::AppState;
use crate::auth::middleware::auth_middleware;
use crate::feed::controller;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/feed", get(controller::get_feed))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
