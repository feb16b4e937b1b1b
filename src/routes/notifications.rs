use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use super::AppState;
use crate::auth::middleware::auth_middleware;
use crate::notification::controller;
use crate::websocket::notifications::ws_handler;

pub fn routes(state: AppState) -> Router<AppState> {
    let private_routes = Router::new()
        .route("/api/notifications", get(controller::list_notifications))
        .route(
            "/api/notifications/mark-all-read",
            patch(controller::mark_all_read),
        )
        .route("/api/notifications/:id/mark-read", patch(controller::mark_read))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    // Browsers cannot set headers on the upgrade request, the socket authenticates from its query
    Router::new()
        .route("/api/notifications/ws", get(ws_handler))
        .merge(private_routes)
}
