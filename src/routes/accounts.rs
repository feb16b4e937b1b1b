use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::AppState;
use crate::account::controller as account;
use crate::auth::controller as auth;
use crate::auth::middleware::{auth_middleware, optional_auth_middleware};
use crate::follow::controller as follow;

pub fn routes(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/api/accounts/register", post(auth::register))
        .route("/api/accounts/login", post(auth::login))
        .route("/api/accounts/users/:user_id", get(account::get_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let private_routes = Router::new()
        .route(
            "/api/accounts/profile",
            get(account::get_profile)
                .patch(account::update_profile)
                .delete(account::delete_profile),
        )
        .route("/api/accounts/follow/:user_id", post(follow::follow_user))
        .route("/api/accounts/unfollow/:user_id", post(follow::unfollow_user))
        .route("/api/accounts/followers", get(follow::my_followers))
        .route("/api/accounts/followers/:user_id", get(follow::user_followers))
        .route("/api/accounts/following", get(follow::my_following))
        .route("/api/accounts/following/:user_id", get(follow::user_following))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public_routes.merge(private_routes)
}
