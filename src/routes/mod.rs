pub mod accounts;
pub mod comments;
pub mod feed;
pub mod health;
pub mod notifications;
pub mod posts;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::auth::jwt::JwtKeys;
use crate::cache::redis::RedisCache;
use crate::config::AppConfig;
use crate::notification::service::{NotificationService, NotificationSink};
use crate::store::Store;

/// Shared handles every handler can reach
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt: Arc<JwtKeys>,
    pub redis_cache: Option<RedisCache>,
    pub sink: Option<Arc<dyn NotificationSink>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, redis_cache: Option<RedisCache>, config: AppConfig) -> Self {
        let sink = redis_cache
            .clone()
            .map(|cache| Arc::new(cache) as Arc<dyn NotificationSink>);
        Self {
            store,
            jwt: Arc::new(JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours)),
            redis_cache,
            sink,
            config: Arc::new(config),
        }
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.store.clone(), self.sink.clone())
    }
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if config.debug {
        return Some(CorsLayer::permissive());
    }
    if config.allowed_origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(health::routes())
        .merge(accounts::routes(state.clone()))
        .merge(feed::routes(state.clone()))
        .merge(posts::routes(state.clone()))
        .merge(comments::routes(state.clone()))
        .merge(notifications::routes(state.clone()))
        .route(
            "/",
            get(|| async { "Welcome to the Social Graph Backend API" }),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&config) {
        router = router.layer(cors);
    }

    if config.security_headers {
        router = router
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::REFERRER_POLICY,
                HeaderValue::from_static("same-origin"),
            ));
    }

    router
}
