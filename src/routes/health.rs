use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use super::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// "healthy", "degraded" when Redis is unreachable, "unhealthy" when the store is
    #[schema(example = "healthy")]
    status: String,
    #[schema(example = "postgres")]
    backend: String,
    database: String,
    cache: String,
}

/// Public health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Server is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Store is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("Health check: store ping failed: {}", e);
            "error"
        }
    };

    let cache = match &state.redis_cache {
        None => "disabled",
        Some(cache) => match cache.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                warn!("Health check: redis ping failed: {}", e);
                "error"
            }
        },
    };

    let (status_code, status) = match (database, cache) {
        ("error", _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        (_, "error") => (StatusCode::OK, "degraded"),
        _ => (StatusCode::OK, "healthy"),
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            backend: state.store.backend().to_string(),
            database: database.to_string(),
            cache: cache.to_string(),
        }),
    )
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_memory_store_without_redis_is_healthy() {
        let config = AppConfig::from_lookup(|key| match key {
            "DEBUG" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::new(Arc::new(MemoryStore::new()), None, config);

        let (status, Json(body)) = health_check(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.backend, "memory");
        assert_eq!(body.cache, "disabled");
    }
}
