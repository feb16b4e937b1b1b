use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CommentRepository, FollowRepository, LikeRepository, NotificationRepository, PostRepository,
    Store, StoreError, UserRepository, WriteOutcome,
};
use crate::account::model::{FollowCounts, NewUser, ProfileUpdate, User, UserBrief};
use crate::comment::model::{Comment, CommentFilter, NewComment};
use crate::notification::model::{NewNotification, Notification, NotificationTarget, Verb};
use crate::pagination::{slice_page, PageRequest, Paginated};
use crate::post::model::{NewPost, Post, PostFilter, PostOrdering, PostStats, PostUpdate};

#[derive(Debug, Clone)]
struct UserRow {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct NotificationRow {
    id: i64,
    recipient_id: Uuid,
    actor_id: Uuid,
    verb: Verb,
    target: NotificationTarget,
    timestamp: DateTime<Utc>,
    read: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<Uuid, UserRow>,
    /// (follower, followee)
    follows: BTreeSet<(Uuid, Uuid)>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    /// (user, post)
    likes: BTreeSet<(Uuid, i64)>,
    notifications: BTreeMap<i64, NotificationRow>,
    last_post_id: i64,
    last_comment_id: i64,
    last_notification_id: i64,
}

impl MemoryState {
    fn brief(&self, id: Uuid) -> UserBrief {
        match self.users.get(&id) {
            Some(row) => row.user.brief(),
            None => UserBrief {
                id,
                username: String::new(),
            },
        }
    }

    fn briefs_sorted(&self, ids: impl Iterator<Item = Uuid>) -> Vec<UserBrief> {
        let mut briefs: Vec<UserBrief> = ids.map(|id| self.brief(id)).collect();
        briefs.sort_by(|a, b| a.username.cmp(&b.username));
        briefs
    }

    fn post(&self, row: &PostRow) -> Post {
        Post {
            id: row.id,
            title: row.title.clone(),
            content: row.content.clone(),
            author: self.brief(row.author_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author: self.brief(row.author_id),
            content: row.content.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn notification(&self, row: &NotificationRow) -> Notification {
        Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            actor: self.brief(row.actor_id),
            verb: row.verb,
            target: row.target,
            timestamp: row.timestamp,
            read: row.read,
        }
    }

    fn insert_notification(&mut self, new: NewNotification) -> Notification {
        self.last_notification_id += 1;
        let row = NotificationRow {
            id: self.last_notification_id,
            recipient_id: new.recipient_id,
            actor_id: new.actor_id,
            verb: new.verb,
            target: new.target,
            timestamp: Utc::now(),
            read: false,
        };
        let notification = self.notification(&row);
        self.notifications.insert(row.id, row);
        notification
    }

    fn ensure_user(&self, id: Uuid) -> Result<(), StoreError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference("user"))
        }
    }

    fn ensure_post(&self, id: i64) -> Result<(), StoreError> {
        if self.posts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference("post"))
        }
    }

    fn ensure_notification_refs(&self, new: &NewNotification) -> Result<(), StoreError> {
        self.ensure_user(new.recipient_id)?;
        self.ensure_user(new.actor_id)?;
        match new.target {
            NotificationTarget::Post(id) => self.ensure_post(id),
            NotificationTarget::User(id) => self.ensure_user(id),
        }
    }

    /// Drops the post and every row hanging off it
    fn remove_post(&mut self, id: i64) -> bool {
        if self.posts.remove(&id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.post_id != id);
        self.likes.retain(|(_, post_id)| *post_id != id);
        self.notifications
            .retain(|_, n| n.target != NotificationTarget::Post(id));
        true
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Process-local store; every operation runs under one write or read guard
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        let username_taken = state
            .users
            .values()
            .any(|row| row.user.username.eq_ignore_ascii_case(&new.username));
        if username_taken {
            return Err(StoreError::Duplicate("username"));
        }
        let email_taken = state
            .users
            .values()
            .any(|row| row.user.email.eq_ignore_ascii_case(&new.email));
        if email_taken {
            return Err(StoreError::Duplicate("email"));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            bio: new.bio,
            role: new.role,
            date_joined: Utc::now(),
        };
        state.users.insert(
            user.id,
            UserRow {
                user: user.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|row| row.user.clone()))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|row| row.user.username.eq_ignore_ascii_case(username))
            .map(|row| (row.user.clone(), row.password_hash.clone())))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut state = self.state.write().await;

        if let Some(email) = &update.email {
            let taken = state
                .users
                .values()
                .any(|row| row.user.id != id && row.user.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(StoreError::Duplicate("email"));
            }
        }

        let Some(row) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = update.email {
            row.user.email = email;
        }
        if let Some(bio) = update.bio {
            row.user.bio = bio;
        }
        Ok(Some(row.user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }

        let owned_posts: Vec<i64> = state
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned_posts {
            state.remove_post(post_id);
        }

        state.follows.retain(|(a, b)| *a != id && *b != id);
        state.comments.retain(|_, c| c.author_id != id);
        state.likes.retain(|(user, _)| *user != id);
        state.notifications.retain(|_, n| {
            n.recipient_id != id && n.actor_id != id && n.target != NotificationTarget::User(id)
        });
        Ok(true)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn insert_follow(
        &self,
        follower: Uuid,
        followee: Uuid,
        notification: Option<NewNotification>,
    ) -> Result<WriteOutcome, StoreError> {
        let mut state = self.state.write().await;
        state.ensure_user(follower)?;
        state.ensure_user(followee)?;
        if let Some(new) = &notification {
            state.ensure_notification_refs(new)?;
        }

        if !state.follows.insert((follower, followee)) {
            return Ok(WriteOutcome::Unchanged);
        }
        let notification = notification.map(|new| state.insert_notification(new));
        Ok(WriteOutcome::Applied { notification })
    }

    async fn delete_follow(&self, follower: Uuid, followee: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.follows.remove(&(follower, followee)))
    }

    async fn followers(&self, user: Uuid) -> Result<Vec<UserBrief>, StoreError> {
        let state = self.state.read().await;
        let ids = state
            .follows
            .iter()
            .filter(|(_, followee)| *followee == user)
            .map(|(follower, _)| *follower);
        Ok(state.briefs_sorted(ids))
    }

    async fn following(&self, user: Uuid) -> Result<Vec<UserBrief>, StoreError> {
        let state = self.state.read().await;
        let ids = state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user)
            .map(|(_, followee)| *followee);
        Ok(state.briefs_sorted(ids))
    }

    async fn following_ids(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user)
            .map(|(_, followee)| *followee)
            .collect())
    }

    async fn follow_counts(&self, user: Uuid) -> Result<FollowCounts, StoreError> {
        let state = self.state.read().await;
        let mut counts = FollowCounts::default();
        for (follower, followee) in &state.follows {
            if *followee == user {
                counts.followers += 1;
            }
            if *follower == user {
                counts.following += 1;
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, new: NewPost) -> Result<Post, StoreError> {
        let mut state = self.state.write().await;
        state.ensure_user(new.author_id)?;

        state.last_post_id += 1;
        let now = Utc::now();
        let row = PostRow {
            id: state.last_post_id,
            title: new.title,
            content: new.content,
            author_id: new.author_id,
            created_at: now,
            updated_at: now,
        };
        let post = state.post(&row);
        state.posts.insert(row.id, row);
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let state = self.state.read().await;
        Ok(state.posts.get(&id).map(|row| state.post(row)))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Paginated<Post>, StoreError> {
        let state = self.state.read().await;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut rows: Vec<&PostRow> = state
            .posts
            .values()
            .filter(|p| filter.author.map_or(true, |author| p.author_id == author))
            .filter(|p| {
                needle.as_deref().map_or(true, |n| {
                    contains_ci(&p.title, n) || contains_ci(&p.content, n)
                })
            })
            .collect();

        // ids grow with insertion order, so they break timestamp ties
        match filter.ordering {
            PostOrdering::NewestFirst => {
                rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)))
            }
            PostOrdering::OldestFirst => {
                rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)))
            }
            PostOrdering::RecentlyUpdated => {
                rows.sort_by(|a, b| (b.updated_at, b.id).cmp(&(a.updated_at, a.id)))
            }
            PostOrdering::LeastRecentlyUpdated => {
                rows.sort_by(|a, b| (a.updated_at, a.id).cmp(&(b.updated_at, b.id)))
            }
        }

        let total = rows.len() as u64;
        let items = slice_page(&rows, page)
            .into_iter()
            .map(|row| state.post(row))
            .collect();
        Ok(Paginated::new(items, total, page))
    }

    async fn filter_by_author_in(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Paginated<Post>, StoreError> {
        let state = self.state.read().await;
        let authors: HashSet<&Uuid> = authors.iter().collect();

        let mut rows: Vec<&PostRow> = state
            .posts
            .values()
            .filter(|p| authors.contains(&p.author_id))
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = rows.len() as u64;
        let items = slice_page(&rows, page)
            .into_iter()
            .map(|row| state.post(row))
            .collect();
        Ok(Paginated::new(items, total, page))
    }

    async fn update_post(&self, id: i64, update: PostUpdate) -> Result<Option<Post>, StoreError> {
        let mut state = self.state.write().await;
        let Some(row) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            row.title = title;
        }
        if let Some(content) = update.content {
            row.content = content;
        }
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(Some(state.post(&row)))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.remove_post(id))
    }

    async fn post_stats(
        &self,
        post_ids: &[i64],
        viewer: Option<Uuid>,
    ) -> Result<Vec<(i64, PostStats)>, StoreError> {
        let state = self.state.read().await;
        Ok(post_ids
            .iter()
            .filter(|id| state.posts.contains_key(id))
            .map(|&id| {
                let stats = PostStats {
                    comments_count: state.comments.values().filter(|c| c.post_id == id).count()
                        as u64,
                    likes_count: state.likes.iter().filter(|(_, p)| *p == id).count() as u64,
                    is_liked: viewer.map_or(false, |user| state.likes.contains(&(user, id))),
                };
                (id, stats)
            })
            .collect())
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn insert_like(
        &self,
        user: Uuid,
        post_id: i64,
        notification: Option<NewNotification>,
    ) -> Result<WriteOutcome, StoreError> {
        let mut state = self.state.write().await;
        state.ensure_user(user)?;
        state.ensure_post(post_id)?;
        if let Some(new) = &notification {
            state.ensure_notification_refs(new)?;
        }

        if !state.likes.insert((user, post_id)) {
            return Ok(WriteOutcome::Unchanged);
        }
        let notification = notification.map(|new| state.insert_notification(new));
        Ok(WriteOutcome::Applied { notification })
    }

    async fn delete_like(&self, user: Uuid, post_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if !state.likes.remove(&(user, post_id)) {
            return Ok(false);
        }
        state.notifications.retain(|_, n| {
            !(n.actor_id == user
                && n.verb == Verb::Like
                && n.target == NotificationTarget::Post(post_id))
        });
        Ok(true)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create_comment(
        &self,
        new: NewComment,
        notification: Option<NewNotification>,
    ) -> Result<(Comment, Option<Notification>), StoreError> {
        let mut state = self.state.write().await;
        state.ensure_user(new.author_id)?;
        state.ensure_post(new.post_id)?;
        if let Some(n) = &notification {
            state.ensure_notification_refs(n)?;
        }

        state.last_comment_id += 1;
        let now = Utc::now();
        let row = CommentRow {
            id: state.last_comment_id,
            post_id: new.post_id,
            author_id: new.author_id,
            content: new.content,
            created_at: now,
            updated_at: now,
        };
        let comment = state.comment(&row);
        state.comments.insert(row.id, row);

        let notification = notification.map(|n| state.insert_notification(n));
        Ok((comment, notification))
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, StoreError> {
        let state = self.state.read().await;
        Ok(state.comments.get(&id).map(|row| state.comment(row)))
    }

    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: PageRequest,
    ) -> Result<Paginated<Comment>, StoreError> {
        let state = self.state.read().await;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());

        // BTreeMap order is id order, which is creation order
        let rows: Vec<&CommentRow> = state
            .comments
            .values()
            .filter(|c| filter.post.map_or(true, |post| c.post_id == post))
            .filter(|c| filter.author.map_or(true, |author| c.author_id == author))
            .filter(|c| needle.as_deref().map_or(true, |n| contains_ci(&c.content, n)))
            .collect();

        let total = rows.len() as u64;
        let items = slice_page(&rows, page)
            .into_iter()
            .map(|row| state.comment(row))
            .collect();
        Ok(Paginated::new(items, total, page))
    }

    async fn update_comment(
        &self,
        id: i64,
        content: String,
    ) -> Result<Option<Comment>, StoreError> {
        let mut state = self.state.write().await;
        let Some(row) = state.comments.get_mut(&id) else {
            return Ok(None);
        };
        row.content = content;
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(Some(state.comment(&row)))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_notifications(
        &self,
        recipient: Uuid,
        page: PageRequest,
    ) -> Result<Paginated<Notification>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<&NotificationRow> = state
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient)
            .collect();
        rows.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));

        let total = rows.len() as u64;
        let items = slice_page(&rows, page)
            .into_iter()
            .map(|row| state.notification(row))
            .collect();
        Ok(Paginated::new(items, total, page))
    }

    async fn count_unread(&self, recipient: Uuid) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient && !n.read)
            .count() as u64)
    }

    async fn mark_read(&self, id: i64, recipient: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.notifications.get_mut(&id) {
            Some(row) if row.recipient_id == recipient => {
                row.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, recipient: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for row in state.notifications.values_mut() {
            if row.recipient_id == recipient && !row.read {
                row.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Role;

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

    async fn post(store: &MemoryStore, author: Uuid, title: &str) -> Post {
        store
            .create_post(NewPost {
                author_id: author,
                title: title.to_string(),
                content: "content".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let store = MemoryStore::new();
        user(&store, "alice").await;

        let err = store
            .create_user(NewUser {
                username: "ALICE".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
                bio: String::new(),
                role: Role::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("username")));

        let err = store
            .create_user(NewUser {
                username: "alice2".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
                bio: String::new(),
                role: Role::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
    }

    #[tokio::test]
    async fn test_follow_edge_is_unique() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let first = store.insert_follow(alice.id, bob.id, None).await.unwrap();
        assert_eq!(first, WriteOutcome::Applied { notification: None });
        let second = store.insert_follow(alice.id, bob.id, None).await.unwrap();
        assert_eq!(second, WriteOutcome::Unchanged);

        assert_eq!(store.following_ids(alice.id).await.unwrap(), vec![bob.id]);
        assert_eq!(store.followers(bob.id).await.unwrap(), vec![alice.brief()]);
        let counts = store.follow_counts(alice.id).await.unwrap();
        assert_eq!(counts, FollowCounts { followers: 0, following: 1 });
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_missing_reference() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let err = store
            .insert_follow(alice.id, Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("user")));
    }

    #[tokio::test]
    async fn test_like_with_notification_then_unlike_removes_it() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let p = post(&store, bob.id, "hello").await;

        let new = NewNotification {
            recipient_id: bob.id,
            actor_id: alice.id,
            verb: Verb::Like,
            target: NotificationTarget::Post(p.id),
        };
        let outcome = store.insert_like(alice.id, p.id, Some(new.clone())).await.unwrap();
        match outcome {
            WriteOutcome::Applied {
                notification: Some(n),
            } => {
                assert_eq!(n.actor, alice.brief());
                assert_eq!(n.verb, Verb::Like);
                assert!(!n.read);
            }
            other => panic!("Expected applied like, got {:?}", other),
        }
        assert_eq!(
            store.insert_like(alice.id, p.id, Some(new)).await.unwrap(),
            WriteOutcome::Unchanged
        );
        assert_eq!(store.count_unread(bob.id).await.unwrap(), 1);

        assert!(store.delete_like(alice.id, p.id).await.unwrap());
        assert!(!store.delete_like(alice.id, p.id).await.unwrap());
        assert_eq!(store.count_unread(bob.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_post_stats_are_batched_and_derived() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let p1 = post(&store, bob.id, "one").await;
        let p2 = post(&store, bob.id, "two").await;

        store.insert_like(alice.id, p1.id, None).await.unwrap();
        store.insert_like(bob.id, p1.id, None).await.unwrap();
        store
            .create_comment(
                NewComment {
                    post_id: p2.id,
                    author_id: alice.id,
                    content: "nice".to_string(),
                },
                None,
            )
            .await
            .unwrap();

        let stats = store
            .post_stats(&[p1.id, p2.id, 999], Some(alice.id))
            .await
            .unwrap();
        assert_eq!(
            stats,
            vec![
                (
                    p1.id,
                    PostStats {
                        comments_count: 0,
                        likes_count: 2,
                        is_liked: true
                    }
                ),
                (
                    p2.id,
                    PostStats {
                        comments_count: 1,
                        likes_count: 0,
                        is_liked: false
                    }
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_posts_filters_and_orders() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let first = post(&store, alice.id, "Rust tips").await;
        let second = post(&store, bob.id, "Gardening").await;
        let third = post(&store, alice.id, "More RUST").await;

        let page = PageRequest::new(1, 10);
        let newest = store.list_posts(&PostFilter::default(), page).await.unwrap();
        let ids: Vec<i64> = newest.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let filter = PostFilter {
            search: Some("rust".to_string()),
            ordering: PostOrdering::OldestFirst,
            ..Default::default()
        };
        let found = store.list_posts(&filter, page).await.unwrap();
        let ids: Vec<i64> = found.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);
        assert_eq!(found.total, 2);

        let filter = PostFilter {
            author: Some(bob.id),
            ..Default::default()
        };
        let by_bob = store.list_posts(&filter, page).await.unwrap();
        assert_eq!(by_bob.items.len(), 1);
        assert_eq!(by_bob.items[0].author, bob.brief());
    }

    #[tokio::test]
    async fn test_mark_read_is_recipient_scoped() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let outcome = store
            .insert_follow(
                alice.id,
                bob.id,
                Some(NewNotification {
                    recipient_id: bob.id,
                    actor_id: alice.id,
                    verb: Verb::Follow,
                    target: NotificationTarget::User(bob.id),
                }),
            )
            .await
            .unwrap();
        let WriteOutcome::Applied {
            notification: Some(notification),
        } = outcome
        else {
            panic!("Expected follow notification");
        };

        assert!(!store.mark_read(notification.id, alice.id).await.unwrap());
        assert!(store.mark_read(notification.id, bob.id).await.unwrap());
        assert_eq!(store.mark_all_read(bob.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let carol = user(&store, "carol").await;

        let bobs_post = post(&store, bob.id, "bob's").await;
        let carols_post = post(&store, carol.id, "carol's").await;
        store
            .insert_follow(
                bob.id,
                alice.id,
                Some(NewNotification {
                    recipient_id: alice.id,
                    actor_id: bob.id,
                    verb: Verb::Follow,
                    target: NotificationTarget::User(alice.id),
                }),
            )
            .await
            .unwrap();
        store.insert_follow(alice.id, bob.id, None).await.unwrap();
        store
            .insert_like(
                bob.id,
                carols_post.id,
                Some(NewNotification {
                    recipient_id: carol.id,
                    actor_id: bob.id,
                    verb: Verb::Like,
                    target: NotificationTarget::Post(carols_post.id),
                }),
            )
            .await
            .unwrap();
        store
            .create_comment(
                NewComment {
                    post_id: carols_post.id,
                    author_id: bob.id,
                    content: "hi".to_string(),
                },
                None,
            )
            .await
            .unwrap();
        store.insert_like(carol.id, bobs_post.id, None).await.unwrap();

        assert!(store.delete_user(bob.id).await.unwrap());
        assert!(!store.delete_user(bob.id).await.unwrap());

        assert!(store.find_post(bobs_post.id).await.unwrap().is_none());
        assert!(store.following_ids(alice.id).await.unwrap().is_empty());
        assert!(store.followers(alice.id).await.unwrap().is_empty());
        assert_eq!(store.count_unread(alice.id).await.unwrap(), 0);
        assert_eq!(store.count_unread(carol.id).await.unwrap(), 0);

        let stats = store.post_stats(&[carols_post.id], None).await.unwrap();
        assert_eq!(stats[0].1, PostStats::default());
    }
}
