use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::notification::model::{Notification, NotificationError, NotificationResponse};
use crate::notification::service::NotificationSink;

/// Per-user pub/sub channel prefix
pub const NOTIFICATION_CHANNEL_PREFIX: &str = "notifications:user";

pub fn notification_channel(user_id: &Uuid) -> String {
    format!("{}:{}", NOTIFICATION_CHANNEL_PREFIX, user_id)
}

#[derive(Debug, Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub fn new(client: Client) -> Self {
        // Connection validation happens on first use
        Self { client }
    }

    pub fn open(url: &str) -> Result<Self, RedisError> {
        Ok(Self::new(Client::open(url)?))
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }

    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let reply: String = redis::cmd("PING").query_async(&mut connection).await?;
        debug!("Redis ping replied {}", reply);
        Ok(())
    }

    /// Returns the number of subscribers that received the message
    pub async fn publish_message(&self, channel: &str, payload: &str) -> Result<i64, RedisError> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        connection.publish(channel, payload).await
    }
}

#[async_trait]
impl NotificationSink for RedisCache {
    async fn publish(&self, notification: &Notification) -> Result<(), NotificationError> {
        let channel = notification_channel(&notification.recipient_id);
        let payload = serde_json::to_string(&NotificationResponse::from(notification.clone()))?;

        let receivers = self.publish_message(&channel, &payload).await?;
        info!(
            "Published {} notification {} to {} ({} receivers)",
            notification.verb.as_str(),
            notification.id,
            channel,
            receivers
        );
        Ok(())
    }
}
