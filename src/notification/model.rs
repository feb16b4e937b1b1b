use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::account::model::UserBrief;
use crate::store::StoreError;

pub const NOTIFICATIONS_PER_PAGE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Follow,
    Like,
    Comment,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Follow => "follow",
            Verb::Like => "like",
            Verb::Comment => "comment",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "follow" => Some(Verb::Follow),
            "like" => Some(Verb::Like),
            "comment" => Some(Verb::Comment),
            _ => None,
        }
    }
}

/// What the notification points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum NotificationTarget {
    Post(i64),
    User(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: Uuid,
    pub actor: UserBrief,
    pub verb: Verb,
    pub target: NotificationTarget,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

/// A notification row waiting to be written alongside its triggering action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub verb: Verb,
    pub target: NotificationTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub actor: UserBrief,
    pub verb: Verb,
    #[schema(value_type = Object, example = json!({"type": "post", "id": 7}))]
    pub target: NotificationTarget,
    #[schema(value_type = DateTimeWrapper)]
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            actor: notification.actor,
            verb: notification.verb,
            target: notification.target,
            timestamp: notification.timestamp,
            read: notification.read,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationListResponse {
    pub unread_count: u64,
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub notifications: Vec<NotificationResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkReadResponse {
    #[schema(example = "Notification marked as read")]
    pub message: String,
    pub notification_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    #[schema(example = "3 notifications marked as read")]
    pub message: String,
    pub updated_count: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    CacheError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Notification not found")]
    NotFound,
}
