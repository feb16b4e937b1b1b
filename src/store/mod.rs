//! Repository traits over every entity, plus the two backends.
//!
//! Each method is one atomic unit of work. Writes that trigger a notification
//! take the composed [`NewNotification`] and persist it together with the
//! primary row, so neither can exist without the other.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::model::{FollowCounts, NewUser, ProfileUpdate, User, UserBrief};
use crate::comment::model::{Comment, CommentFilter, NewComment};
use crate::notification::model::{NewNotification, Notification};
use crate::pagination::{PageRequest, Paginated};
use crate::post::model::{NewPost, Post, PostFilter, PostStats, PostUpdate};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("Referenced {0} does not exist")]
    MissingReference(&'static str),
}

/// Result of an insert guarded by a uniqueness constraint
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Applied { notification: Option<Notification> },
    Unchanged,
}

#[async_trait]
pub trait UserRepository {
    /// Fails with `Duplicate("username")` or `Duplicate("email")`
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// The user and its password hash
    async fn find_credentials(&self, username: &str)
        -> Result<Option<(User, String)>, StoreError>;
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError>;
    /// Removes the user and everything referencing it
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait FollowRepository {
    async fn insert_follow(
        &self,
        follower: Uuid,
        followee: Uuid,
        notification: Option<NewNotification>,
    ) -> Result<WriteOutcome, StoreError>;
    async fn delete_follow(&self, follower: Uuid, followee: Uuid) -> Result<bool, StoreError>;
    async fn followers(&self, user: Uuid) -> Result<Vec<UserBrief>, StoreError>;
    async fn following(&self, user: Uuid) -> Result<Vec<UserBrief>, StoreError>;
    async fn following_ids(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError>;
    async fn follow_counts(&self, user: Uuid) -> Result<FollowCounts, StoreError>;
}

#[async_trait]
pub trait PostRepository {
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError>;
    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Paginated<Post>, StoreError>;
    /// Posts by any of `authors`, newest first
    async fn filter_by_author_in(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Paginated<Post>, StoreError>;
    async fn update_post(&self, id: i64, update: PostUpdate) -> Result<Option<Post>, StoreError>;
    async fn delete_post(&self, id: i64) -> Result<bool, StoreError>;
    /// Counts for a batch of posts; ids without rows are absent from the result
    async fn post_stats(
        &self,
        post_ids: &[i64],
        viewer: Option<Uuid>,
    ) -> Result<Vec<(i64, PostStats)>, StoreError>;
}

#[async_trait]
pub trait LikeRepository {
    async fn insert_like(
        &self,
        user: Uuid,
        post_id: i64,
        notification: Option<NewNotification>,
    ) -> Result<WriteOutcome, StoreError>;
    /// Also removes the like notification sent for this like
    async fn delete_like(&self, user: Uuid, post_id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CommentRepository {
    async fn create_comment(
        &self,
        comment: NewComment,
        notification: Option<NewNotification>,
    ) -> Result<(Comment, Option<Notification>), StoreError>;
    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError>;
    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: PageRequest,
    ) -> Result<Paginated<Comment>, StoreError>;
    async fn update_comment(&self, id: i64, content: String)
        -> Result<Option<Comment>, StoreError>;
    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait NotificationRepository {
    /// Newest first
    async fn list_notifications(
        &self,
        recipient: Uuid,
        page: PageRequest,
    ) -> Result<Paginated<Notification>, StoreError>;
    async fn count_unread(&self, recipient: Uuid) -> Result<u64, StoreError>;
    /// False when no notification with this id belongs to `recipient`
    async fn mark_read(&self, id: i64, recipient: Uuid) -> Result<bool, StoreError>;
    async fn mark_all_read(&self, recipient: Uuid) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait Store:
    UserRepository
    + FollowRepository
    + PostRepository
    + LikeRepository
    + CommentRepository
    + NotificationRepository
    + Send
    + Sync
{
    fn backend(&self) -> &'static str;
    async fn ping(&self) -> Result<(), StoreError>;
}
