mod account;
mod api_doc;
mod auth;
mod cache;
mod comment;
mod config;
mod controller;
mod db;
mod feed;
mod follow;
mod notification;
mod pagination;
mod post;
mod routes;
mod schema_ext;
mod store;
mod websocket;

use std::{net::SocketAddr, sync::Arc};

use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

use crate::cache::redis::RedisCache;
use crate::config::AppConfig;
use crate::routes::AppState;
use crate::store::{MemoryStore, PgStore, Store};

async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>, sqlx::Error> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(url)
        .await?;
    let store = PgStore::new(pool);

    if !db::check_db_initialized(store.pool()).await {
        db::init_db(store.pool()).await?;
    }
    info!("Connected to Postgres");
    Ok(Arc::new(store))
}

fn open_redis(config: &AppConfig) -> Option<RedisCache> {
    let Some(url) = &config.redis_url else {
        info!("No Redis URL configured, realtime notifications disabled");
        return None;
    };

    match RedisCache::open(url) {
        Ok(cache) => {
            info!("Redis notifications enabled");
            Some(cache)
        }
        Err(e) => {
            error!("Failed to open Redis client: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    if config.uses_dev_secret() {
        warn!("JWT_SECRET not set, signing tokens with the development secret");
    }

    let store = open_store(&config).await?;
    let redis_cache = open_redis(&config);

    let host = config.host;
    let first_port = config.port;
    let attempts = config.port_attempts.max(1);
    let app = routes::app(AppState::new(store, redis_cache, config));

    for offset in 0..attempts {
        let port = first_port.saturating_add(offset);
        let addr = SocketAddr::new(host, port);
        match axum::Server::try_bind(&addr) {
            Ok(server) => {
                info!("Server listening on http://{}", addr);
                info!("API documentation at http://{}/docs", addr);
                info!(
                    "Notification socket at ws://{}/api/notifications/ws?token=<JWT>",
                    addr
                );
                return server
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| e.into());
            }
            Err(e) => warn!("Could not bind {}: {}", addr, e),
        }
    }

    Err(format!("Failed to bind any port from {} ({} attempts)", first_port, attempts).into())
}
