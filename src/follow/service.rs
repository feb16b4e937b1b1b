use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::account::model::{PublicProfileResponse, User};
use crate::follow::model::{FollowError, FollowStateResponse, FollowersResponse, FollowingResponse};
use crate::notification::model::{NotificationTarget, Verb};
use crate::notification::service::NotificationService;
use crate::store::{Store, StoreError, WriteOutcome};

pub struct FollowService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl FollowService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    async fn existing_user(&self, user_id: Uuid) -> Result<User, FollowError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(FollowError::UserNotFound)
    }

    async fn follow_state(
        &self,
        target: User,
        message: String,
        is_following: bool,
    ) -> Result<FollowStateResponse, FollowError> {
        let counts = self.store.follow_counts(target.id).await?;
        Ok(FollowStateResponse {
            message,
            user: PublicProfileResponse::new(target, counts),
            is_following,
        })
    }

    pub async fn follow(
        &self,
        actor: Uuid,
        target_id: Uuid,
    ) -> Result<FollowStateResponse, FollowError> {
        if actor == target_id {
            return Err(FollowError::SelfFollow);
        }
        let target = self.existing_user(target_id).await?;

        let notification = NotificationService::compose(
            target.id,
            actor,
            Verb::Follow,
            NotificationTarget::User(target.id),
        );
        let created = match self.store.insert_follow(actor, target.id, notification).await {
            Ok(WriteOutcome::Applied { notification }) => notification,
            Ok(WriteOutcome::Unchanged) => {
                return Err(FollowError::AlreadyFollowing(target.username))
            }
            Err(StoreError::MissingReference(_)) => return Err(FollowError::UserNotFound),
            Err(e) => return Err(e.into()),
        };
        info!("User {} followed {}", actor, target.id);
        self.notifications.publish(created.as_ref()).await;

        let message = format!("You are now following {}", target.username);
        self.follow_state(target, message, true).await
    }

    pub async fn unfollow(
        &self,
        actor: Uuid,
        target_id: Uuid,
    ) -> Result<FollowStateResponse, FollowError> {
        let target = self.existing_user(target_id).await?;

        if !self.store.delete_follow(actor, target.id).await? {
            return Err(FollowError::NotFollowing(target.username));
        }
        info!("User {} unfollowed {}", actor, target.id);

        let message = format!("You have unfollowed {}", target.username);
        self.follow_state(target, message, false).await
    }

    pub async fn followers(&self, user_id: Uuid) -> Result<FollowersResponse, FollowError> {
        let user = self.existing_user(user_id).await?;
        let followers = self.store.followers(user_id).await?;
        Ok(FollowersResponse {
            user: user.brief(),
            followers_count: followers.len() as u64,
            followers,
        })
    }

    pub async fn following(&self, user_id: Uuid) -> Result<FollowingResponse, FollowError> {
        let user = self.existing_user(user_id).await?;
        let following = self.store.following(user_id).await?;
        Ok(FollowingResponse {
            user: user.brief(),
            following_count: following.len() as u64,
            following,
        })
    }
}
