use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::auth::permissions::{authorize, Denied, Resource, AUTHOR_ONLY};
use crate::notification::model::{NotificationTarget, Verb};
use crate::notification::service::NotificationService;
use crate::pagination::PageRequest;
use crate::post::model::{
    CreatePostRequest, LikeResponse, NewPost, Post, PostFilter, PostListParams, PostListResponse,
    PostOrdering, PostResponse, PostUpdate, UpdatePostRequest, POSTS_PER_PAGE, TITLE_MAX_LEN,
};
use crate::store::{Store, StoreError, WriteOutcome};

#[derive(Error, Debug)]
pub enum PostError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Post not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("You have not liked this post")]
    NotLiked { likes_count: u64 },
}

impl From<Denied> for PostError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => PostError::Unauthenticated,
            Denied::Forbidden(reason) => PostError::Forbidden(reason),
        }
    }
}

/// Whether a like request created the like
#[derive(Debug)]
pub enum LikeOutcome {
    Created(LikeResponse),
    AlreadyLiked(LikeResponse),
}

/// Decorates a page of posts with counts fetched in one batch
pub async fn attach_stats(
    store: &dyn Store,
    posts: Vec<Post>,
    viewer: Option<Uuid>,
) -> Result<Vec<PostResponse>, StoreError> {
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let stats: HashMap<i64, _> = store.post_stats(&ids, viewer).await?.into_iter().collect();

    Ok(posts
        .into_iter()
        .map(|post| {
            let post_stats = stats.get(&post.id).copied().unwrap_or_default();
            PostResponse::new(post, post_stats)
        })
        .collect())
}

fn validate_title(title: &str) -> Result<String, PostError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PostError::InvalidInput("Title cannot be empty".to_string()));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(PostError::InvalidInput(format!(
            "Title cannot exceed {} characters",
            TITLE_MAX_LEN
        )));
    }
    Ok(title.to_string())
}

fn validate_content(content: &str) -> Result<String, PostError> {
    if content.trim().is_empty() {
        return Err(PostError::InvalidInput("Content cannot be empty".to_string()));
    }
    Ok(content.to_string())
}

pub struct PostService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    async fn existing_post(&self, id: i64) -> Result<Post, PostError> {
        self.store.find_post(id).await?.ok_or(PostError::NotFound)
    }

    async fn respond(&self, post: Post, viewer: Option<Uuid>) -> Result<PostResponse, PostError> {
        let mut responses = attach_stats(self.store.as_ref(), vec![post], viewer).await?;
        responses.pop().ok_or(PostError::NotFound)
    }

    async fn likes_count(&self, post_id: i64) -> Result<u64, PostError> {
        let stats = self.store.post_stats(&[post_id], None).await?;
        Ok(stats.first().map(|(_, s)| s.likes_count).unwrap_or(0))
    }

    pub async fn create_post(
        &self,
        author: Uuid,
        request: CreatePostRequest,
    ) -> Result<PostResponse, PostError> {
        let new = NewPost {
            author_id: author,
            title: validate_title(&request.title)?,
            content: validate_content(&request.content)?,
        };
        let post = self.store.create_post(new).await?;
        info!("Created post with ID: {}", post.id);
        self.respond(post, Some(author)).await
    }

    pub async fn get_post(&self, id: i64, viewer: Option<Uuid>) -> Result<PostResponse, PostError> {
        let post = self.existing_post(id).await?;
        self.respond(post, viewer).await
    }

    pub async fn list_posts(
        &self,
        params: PostListParams,
        viewer: Option<Uuid>,
    ) -> Result<PostListResponse, PostError> {
        let ordering = match params.ordering.as_deref() {
            None => PostOrdering::default(),
            Some(raw) => PostOrdering::parse(raw).ok_or_else(|| {
                PostError::InvalidInput(format!("Unsupported ordering: {}", raw))
            })?,
        };
        let filter = PostFilter {
            author: params.author,
            search: params.search.filter(|s| !s.trim().is_empty()),
            ordering,
        };
        let page = PageRequest::new(
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(POSTS_PER_PAGE),
        );

        let posts = self.store.list_posts(&filter, page).await?;
        let total_pages = posts.total_pages();
        let results = attach_stats(self.store.as_ref(), posts.items, viewer).await?;

        Ok(PostListResponse {
            count: posts.total,
            page: posts.page,
            page_size: posts.page_size,
            total_pages,
            results,
        })
    }

    pub async fn update_post(
        &self,
        id: i64,
        user: &AuthUser,
        request: UpdatePostRequest,
    ) -> Result<PostResponse, PostError> {
        let post = self.existing_post(id).await?;
        authorize(Some(user), &Resource::owned_by(post.author.id), AUTHOR_ONLY)?;

        let update = PostUpdate {
            title: request.title.as_deref().map(validate_title).transpose()?,
            content: request.content.as_deref().map(validate_content).transpose()?,
        };
        let post = self
            .store
            .update_post(id, update)
            .await?
            .ok_or(PostError::NotFound)?;
        info!("Updated post with ID: {}", id);
        self.respond(post, Some(user.user_id)).await
    }

    pub async fn delete_post(&self, id: i64, user: &AuthUser) -> Result<(), PostError> {
        let post = self.existing_post(id).await?;
        authorize(Some(user), &Resource::owned_by(post.author.id), AUTHOR_ONLY)?;

        if !self.store.delete_post(id).await? {
            return Err(PostError::NotFound);
        }
        info!("Deleted post with ID: {}", id);
        Ok(())
    }

    pub async fn like_post(&self, user_id: Uuid, post_id: i64) -> Result<LikeOutcome, PostError> {
        let post = self.existing_post(post_id).await?;

        let notification = NotificationService::compose(
            post.author.id,
            user_id,
            Verb::Like,
            NotificationTarget::Post(post.id),
        );
        let outcome = match self.store.insert_like(user_id, post.id, notification).await {
            Ok(outcome) => outcome,
            Err(StoreError::MissingReference(_)) => return Err(PostError::NotFound),
            Err(e) => return Err(e.into()),
        };

        let likes_count = self.likes_count(post.id).await?;
        match outcome {
            WriteOutcome::Applied { notification } => {
                info!("User {} liked post {}", user_id, post.id);
                self.notifications.publish(notification.as_ref()).await;
                Ok(LikeOutcome::Created(LikeResponse {
                    message: "Post liked successfully".to_string(),
                    liked: true,
                    likes_count,
                }))
            }
            WriteOutcome::Unchanged => Ok(LikeOutcome::AlreadyLiked(LikeResponse {
                message: "You have already liked this post".to_string(),
                liked: true,
                likes_count,
            })),
        }
    }

    pub async fn unlike_post(
        &self,
        user_id: Uuid,
        post_id: i64,
    ) -> Result<LikeResponse, PostError> {
        let post = self.existing_post(post_id).await?;

        let removed = self.store.delete_like(user_id, post.id).await?;
        let likes_count = self.likes_count(post.id).await?;
        if !removed {
            return Err(PostError::NotLiked { likes_count });
        }
        info!("User {} unliked post {}", user_id, post.id);

        Ok(LikeResponse {
            message: "Post unliked successfully".to_string(),
            liked: false,
            likes_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::model::{NewUser, User};
    use crate::auth::jwt::Role;
    use crate::store::{MemoryStore, NotificationRepository, UserRepository};

    async fn seed(store: &MemoryStore, name: &str, role: Role) -> User {
        store
            .create_user(NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "hash".to_string(),
                bio: String::new(),
                role,
            })
            .await
            .unwrap()
    }

    fn auth(user: &User) -> AuthUser {
        AuthUser {
            user_id: user.id,
            role: user.role,
        }
    }

    fn service(store: &Arc<MemoryStore>) -> PostService {
        PostService::new(store.clone(), NotificationService::new(store.clone(), None))
    }

    fn request(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            content: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_post_validation() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice", Role::User).await;
        let service = service(&store);

        let err = service.create_post(alice.id, request("   ")).await.unwrap_err();
        assert!(matches!(err, PostError::InvalidInput(_)));

        let long = "t".repeat(TITLE_MAX_LEN + 1);
        let err = service.create_post(alice.id, request(&long)).await.unwrap_err();
        assert!(matches!(err, PostError::InvalidInput(_)));

        let created = service.create_post(alice.id, request(" Hello ")).await.unwrap();
        assert_eq!(created.title, "Hello");
        assert_eq!(created.likes_count, 0);
        assert!(!created.is_liked_by_user);
    }

    #[tokio::test]
    async fn test_like_twice_counts_once() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice", Role::User).await;
        let bob = seed(&store, "bob", Role::User).await;
        let service = service(&store);
        let post = service.create_post(bob.id, request("Bob's")).await.unwrap();

        match service.like_post(alice.id, post.id).await.unwrap() {
            LikeOutcome::Created(res) => assert_eq!(res.likes_count, 1),
            other => panic!("Expected a new like, got {:?}", other),
        }
        match service.like_post(alice.id, post.id).await.unwrap() {
            LikeOutcome::AlreadyLiked(res) => {
                assert_eq!(res.likes_count, 1);
                assert!(res.message.contains("already liked"));
            }
            other => panic!("Expected already liked, got {:?}", other),
        }

        let page = store
            .list_notifications(bob.id, PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].verb, Verb::Like);
        assert_eq!(page.items[0].target, NotificationTarget::Post(post.id));
    }

    #[tokio::test]
    async fn test_unlike_restores_state() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice", Role::User).await;
        let bob = seed(&store, "bob", Role::User).await;
        let service = service(&store);
        let post = service.create_post(bob.id, request("Bob's")).await.unwrap();

        let err = service.unlike_post(alice.id, post.id).await.unwrap_err();
        assert!(matches!(err, PostError::NotLiked { likes_count: 0 }));

        service.like_post(alice.id, post.id).await.unwrap();
        let liked = service.get_post(post.id, Some(alice.id)).await.unwrap();
        assert_eq!(liked.likes_count, 1);
        assert!(liked.is_liked_by_user);

        let res = service.unlike_post(alice.id, post.id).await.unwrap();
        assert!(!res.liked);
        assert_eq!(res.likes_count, 0);

        let after = service.get_post(post.id, Some(alice.id)).await.unwrap();
        assert_eq!(after.likes_count, 0);
        assert!(!after.is_liked_by_user);
        assert_eq!(store.count_unread(bob.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_liking_own_post_is_silent() {
        let store = Arc::new(MemoryStore::new());
        let bob = seed(&store, "bob", Role::User).await;
        let service = service(&store);
        let post = service.create_post(bob.id, request("Bob's")).await.unwrap();

        service.like_post(bob.id, post.id).await.unwrap();
        assert_eq!(store.count_unread(bob.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_like_missing_post() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice", Role::User).await;
        let service = service(&store);

        assert!(matches!(
            service.like_post(alice.id, 42).await,
            Err(PostError::NotFound)
        ));
        assert!(matches!(
            service.unlike_post(alice.id, 42).await,
            Err(PostError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_only_author_or_admin_can_modify() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice", Role::User).await;
        let bob = seed(&store, "bob", Role::User).await;
        let admin = seed(&store, "root", Role::Admin).await;
        let service = service(&store);
        let post = service.create_post(bob.id, request("Bob's")).await.unwrap();

        let edit = || UpdatePostRequest {
            title: Some("Edited".to_string()),
            content: None,
        };
        let err = service
            .update_post(post.id, &auth(&alice), edit())
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::Forbidden(_)));
        assert!(matches!(
            service.delete_post(post.id, &auth(&alice)).await,
            Err(PostError::Forbidden(_))
        ));

        let updated = service
            .update_post(post.id, &auth(&bob), edit())
            .await
            .unwrap();
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.content, "Body");

        service.delete_post(post.id, &auth(&admin)).await.unwrap();
        assert!(matches!(
            service.get_post(post.id, None).await,
            Err(PostError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_posts_rejects_unknown_ordering() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let params = PostListParams {
            page: None,
            page_size: None,
            author: None,
            search: None,
            ordering: Some("likes".to_string()),
        };
        assert!(matches!(
            service.list_posts(params, None).await,
            Err(PostError::InvalidInput(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_likes_store_one_like() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice", Role::User).await;
        let bob = seed(&store, "bob", Role::User).await;
        let post = service(&store)
            .create_post(bob.id, request("Popular"))
            .await
            .unwrap();

        let (alice_id, post_id) = (alice.id, post.id);
        let first = service(&store);
        let second = service(&store);
        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.like_post(alice_id, post_id).await }),
            tokio::spawn(async move { second.like_post(alice_id, post_id).await }),
        );
        let outcomes = [a.unwrap().unwrap(), b.unwrap().unwrap()];

        let created = outcomes
            .iter()
            .filter(|o| matches!(o, LikeOutcome::Created(_)))
            .count();
        let repeated = outcomes
            .iter()
            .filter(|o| matches!(o, LikeOutcome::AlreadyLiked(_)))
            .count();
        assert_eq!((created, repeated), (1, 1));

        let detail = service(&store).get_post(post.id, Some(alice.id)).await.unwrap();
        assert_eq!(detail.likes_count, 1);

        let page = store
            .list_notifications(bob.id, PageRequest::new(1, 20))
            .await
            .unwrap();
        let likes = page.items.iter().filter(|n| n.verb == Verb::Like).count();
        assert_eq!(likes, 1);
    }
}
