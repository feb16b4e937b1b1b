use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::notification::model::{
    MarkAllReadResponse, MarkReadResponse, NewNotification, Notification, NotificationError,
    NotificationListResponse, NotificationResponse, NotificationTarget, Verb,
};
use crate::pagination::PageRequest;
use crate::store::Store;

/// Realtime delivery of freshly stored notifications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<(), NotificationError>;
}

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>, sink: Option<Arc<dyn NotificationSink>>) -> Self {
        Self { store, sink }
    }

    /// Builds the row to store with an action; nobody is notified about their own actions
    pub fn compose(
        recipient: Uuid,
        actor: Uuid,
        verb: Verb,
        target: NotificationTarget,
    ) -> Option<NewNotification> {
        if recipient == actor {
            return None;
        }
        Some(NewNotification {
            recipient_id: recipient,
            actor_id: actor,
            verb,
            target,
        })
    }

    /// Best-effort push after the triggering write committed
    pub async fn publish(&self, notification: Option<&Notification>) {
        let (Some(sink), Some(notification)) = (&self.sink, notification) else {
            return;
        };
        if let Err(e) = sink.publish(notification).await {
            warn!(
                "Failed to push notification {} to user {}: {}",
                notification.id, notification.recipient_id, e
            );
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<NotificationListResponse, NotificationError> {
        let notifications = self
            .store
            .list_notifications(user_id, page)
            .await?
            .map(NotificationResponse::from);
        let unread_count = self.store.count_unread(user_id).await?;

        Ok(NotificationListResponse {
            unread_count,
            count: notifications.total,
            page: notifications.page,
            page_size: notifications.page_size,
            total_pages: notifications.total_pages(),
            notifications: notifications.items,
        })
    }

    pub async fn mark_read(
        &self,
        notification_id: i64,
        user_id: Uuid,
    ) -> Result<MarkReadResponse, NotificationError> {
        if !self.store.mark_read(notification_id, user_id).await? {
            return Err(NotificationError::NotFound);
        }
        info!("User {} read notification {}", user_id, notification_id);

        Ok(MarkReadResponse {
            message: "Notification marked as read".to_string(),
            notification_id,
        })
    }

    pub async fn mark_all_read(
        &self,
        user_id: Uuid,
    ) -> Result<MarkAllReadResponse, NotificationError> {
        let updated_count = self.store.mark_all_read(user_id).await?;
        info!("User {} marked {} notifications read", user_id, updated_count);

        Ok(MarkAllReadResponse {
            message: format!("{} notifications marked as read", updated_count),
            updated_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::model::{NewUser, User};
    use crate::auth::jwt::Role;
    use crate::store::{FollowRepository, MemoryStore, UserRepository, WriteOutcome};

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "hash".to_string(),
                bio: String::new(),
                role: Role::User,
            })
            .await
            .unwrap()
    }

    async fn follow(store: &MemoryStore, from: &User, to: &User) -> Notification {
        let new = NotificationService::compose(
            to.id,
            from.id,
            Verb::Follow,
            NotificationTarget::User(to.id),
        );
        match store.insert_follow(from.id, to.id, new).await.unwrap() {
            WriteOutcome::Applied {
                notification: Some(notification),
            } => notification,
            other => panic!("Expected a notification, got {:?}", other),
        }
    }

    #[test]
    fn test_compose_skips_self_actions() {
        let me = Uuid::new_v4();
        assert!(NotificationService::compose(me, me, Verb::Like, NotificationTarget::Post(1))
            .is_none());

        let other = Uuid::new_v4();
        let new =
            NotificationService::compose(other, me, Verb::Like, NotificationTarget::Post(1))
                .unwrap();
        assert_eq!(new.recipient_id, other);
        assert_eq!(new.actor_id, me);
    }

    #[tokio::test]
    async fn test_mark_all_read_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let bob = user(&store, "bob").await;
        for name in ["alice", "carol", "dave"] {
            let follower = user(&store, name).await;
            follow(&store, &follower, &bob).await;
        }

        let service = NotificationService::new(store.clone(), None);
        let listed = service.list(bob.id, PageRequest::new(1, 20)).await.unwrap();
        assert_eq!(listed.unread_count, 3);
        assert_eq!(listed.count, 3);
        assert_eq!(listed.notifications[0].actor.username, "dave");

        let first = service.mark_all_read(bob.id).await.unwrap();
        assert_eq!(first.updated_count, 3);
        let second = service.mark_all_read(bob.id).await.unwrap();
        assert_eq!(second.updated_count, 0);

        let listed = service.list(bob.id, PageRequest::new(1, 20)).await.unwrap();
        assert_eq!(listed.unread_count, 0);
        assert!(listed.notifications.iter().all(|n| n.read));
    }

    #[tokio::test]
    async fn test_mark_read_of_foreign_notification_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let notification = follow(&store, &alice, &bob).await;

        let service = NotificationService::new(store.clone(), None);
        let err = service.mark_read(notification.id, alice.id).await.unwrap_err();
        assert!(matches!(err, NotificationError::NotFound));

        let ok = service.mark_read(notification.id, bob.id).await.unwrap();
        assert_eq!(ok.notification_id, notification.id);
        let listed = service.list(bob.id, PageRequest::new(1, 20)).await.unwrap();
        assert_eq!(listed.unread_count, 0);
    }

    #[tokio::test]
    async fn test_publish_forwards_to_sink() {
        let store = Arc::new(MemoryStore::new());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let notification = follow(&store, &alice, &bob).await;
        let expected_id = notification.id;

        let mut sink = MockNotificationSink::new();
        sink.expect_publish()
            .withf(move |n| n.id == expected_id)
            .times(1)
            .returning(|_| Ok(()));

        let service = NotificationService::new(store, Some(Arc::new(sink)));
        service.publish(Some(&notification)).await;
        service.publish(None).await;
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let notification = follow(&store, &alice, &bob).await;

        let mut sink = MockNotificationSink::new();
        sink.expect_publish()
            .times(1)
            .returning(|_| Err(NotificationError::NotFound));

        let service = NotificationService::new(store.clone(), Some(Arc::new(sink)));
        service.publish(Some(&notification)).await;

        let listed = service.list(bob.id, PageRequest::new(1, 20)).await.unwrap();
        assert_eq!(listed.count, 1);
    }
}
