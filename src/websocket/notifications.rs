use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::{sync::mpsc, time};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::cache::redis::{notification_channel, RedisCache};
use crate::routes::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Query parameters for WebSocket connections
#[derive(Debug, Deserialize)]
pub struct WebSocketParams {
    token: Option<String>,
}

/// First frame sent on a rejected connection
#[derive(Debug, Serialize, Deserialize)]
struct SocketError {
    error: String,
}

fn error_frame(message: &str) -> String {
    serde_json::to_string(&SocketError {
        error: message.to_string(),
    })
    .unwrap_or_else(|_| r#"{"error":"unknown"}"#.to_string())
}

fn authenticate(keys: &JwtKeys, token: &str) -> Result<Uuid, String> {
    let claims = keys
        .validate_token(token)
        .map_err(|e| format!("Invalid token: {}", e))?;
    Uuid::parse_str(&claims.sub).map_err(|e| format!("Invalid user ID in token: {}", e))
}

/// Handle an invalid socket connection (authentication failure)
async fn handle_invalid_socket(mut socket: WebSocket, error_message: String) {
    if let Err(e) = socket.send(Message::Text(error_frame(&error_message))).await {
        error!("Error sending error message on WS: {}", e);
    }
    let _ = socket.close().await;
}

/// Handle a valid WebSocket connection
async fn handle_valid_connection(
    socket: WebSocket,
    user_id: Uuid,
    redis_cache: Option<RedisCache>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(100);

    // Without Redis the socket stays open but never receives pushes
    let redis_task = match redis_cache {
        Some(cache) => {
            let tx_redis = tx.clone();
            Some(tokio::spawn(async move {
                subscribe_to_user_notifications(user_id, cache, tx_redis).await;
            }))
        }
        None => {
            warn!("Realtime notifications disabled: no Redis configured");
            None
        }
    };

    // Forward messages from channel to WebSocket
    let forward_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_sender.send(message).await {
                error!("Error forwarding message to WebSocket: {}", e);
                break;
            }
        }
    });

    let tx_heartbeat = tx;
    let heartbeat_task = tokio::spawn(async move {
        let mut interval = time::interval(HEARTBEAT_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = tx_heartbeat.send(Message::Ping(vec![])).await {
                error!("Error sending heartbeat: {}", e);
                break;
            }
        }
    });

    // Process incoming WebSocket messages
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                info!("WebSocket closed by client");
                break;
            }
            Ok(Message::Pong(_)) => {
                debug!("Received pong from client");
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    if let Some(task) = redis_task {
        task.abort();
    }
    forward_task.abort();
    heartbeat_task.abort();

    info!("WebSocket connection closed for user: {}", user_id);
}

/// Realtime notification stream
///
/// Authenticates with the `token` query parameter, then relays every
/// notification published for the user.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WebSocketParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let token = params.token.unwrap_or_default();

    let user_id = match authenticate(&state.jwt, &token) {
        Ok(user_id) => user_id,
        Err(error_message) => {
            return ws.on_upgrade(move |socket| async move {
                handle_invalid_socket(socket, error_message).await;
            });
        }
    };

    info!("User {} connected to notifications WebSocket", user_id);
    let redis_cache = state.redis_cache.clone();
    ws.on_upgrade(move |socket| async move {
        handle_valid_connection(socket, user_id, redis_cache).await;
    })
}

/// Subscribe to Redis PubSub channel for user notifications
async fn subscribe_to_user_notifications(
    user_id: Uuid,
    redis_cache: RedisCache,
    tx: mpsc::Sender<Message>,
) {
    let channel_name = notification_channel(&user_id);
    info!("Subscribing to Redis channel: {}", channel_name);

    let mut pubsub = match redis_cache.get_client().get_async_pubsub().await {
        Ok(pubsub) => pubsub,
        Err(e) => {
            error!("Failed to get Redis PubSub connection: {}", e);
            return;
        }
    };

    if let Err(e) = pubsub.subscribe(&channel_name).await {
        error!("Failed to subscribe to Redis channel: {}", e);
        return;
    }

    let mut pubsub_stream = pubsub.on_message();
    while let Some(msg) = pubsub_stream.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to get message payload: {}", e);
                continue;
            }
        };

        if let Err(e) = tx.send(Message::Text(payload)).await {
            error!("Failed to forward Redis message to WebSocket: {}", e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Role;

    #[test]
    fn test_error_frame_is_json() {
        let frame = error_frame("Invalid token: \"quoted\"");
        let parsed: SocketError = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed.error, "Invalid token: \"quoted\"");
    }

    #[test]
    fn test_authenticate_token() {
        let keys = JwtKeys::new("ws_secret", 1);
        let user_id = Uuid::new_v4();
        let token = keys.generate_token(&user_id, Role::User).unwrap();

        assert_eq!(authenticate(&keys, &token).unwrap(), user_id);
        assert!(authenticate(&keys, "").is_err());

        let other = JwtKeys::new("other_secret", 1);
        assert!(authenticate(&other, &token)
            .unwrap_err()
            .starts_with("Invalid token"));
    }
}
