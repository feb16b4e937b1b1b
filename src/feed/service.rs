use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::feed::model::{EmptyFeedResponse, Feed, FeedError, FeedResponse};
use crate::pagination::PageRequest;
use crate::post::service::attach_stats;
use crate::store::Store;

pub const NOT_FOLLOWING_MESSAGE: &str =
    "You are not following anyone yet. Follow some users to see their posts!";

pub struct FeedService {
    store: Arc<dyn Store>,
}

impl FeedService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Recomputed on every call from the current follow set
    pub async fn get_feed(&self, user_id: Uuid, page: PageRequest) -> Result<Feed, FeedError> {
        let followees = self.store.following_ids(user_id).await?;
        if followees.is_empty() {
            return Ok(Feed::NotFollowingAnyone(EmptyFeedResponse {
                message: NOT_FOLLOWING_MESSAGE.to_string(),
                following_count: 0,
                count: 0,
                posts: Vec::new(),
            }));
        }

        let posts = self.store.filter_by_author_in(&followees, page).await?;
        debug!(
            "Feed for {} spans {} authors and {} posts",
            user_id,
            followees.len(),
            posts.total
        );
        let total_pages = posts.total_pages();
        let items = attach_stats(self.store.as_ref(), posts.items, Some(user_id)).await?;

        Ok(Feed::Posts(FeedResponse {
            following_count: followees.len() as u64,
            count: posts.total,
            page: posts.page,
            page_size: posts.page_size,
            total_pages,
            posts: items,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::model::{NewUser, User};
    use crate::auth::jwt::Role;
    use crate::post::model::NewPost;
    use crate::store::{
        FollowRepository, LikeRepository, MemoryStore, PostRepository, UserRepository,
    };

    async fn seed(store: &MemoryStore, name: &str) -> User {
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

    async fn post_by(store: &MemoryStore, author: &User, title: &str) -> i64 {
        store
            .create_post(NewPost {
                author_id: author.id,
                title: title.to_string(),
                content: "Body".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn titles(feed: &Feed) -> Vec<String> {
        match feed {
            Feed::Posts(page) => page.posts.iter().map(|p| p.title.clone()).collect(),
            Feed::NotFollowingAnyone(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_feed_when_following_nobody() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice").await;
        let bob = seed(&store, "bob").await;
        post_by(&store, &bob, "unseen").await;

        let feed = FeedService::new(store.clone())
            .get_feed(alice.id, PageRequest::new(1, 10))
            .await
            .unwrap();
        match feed {
            Feed::NotFollowingAnyone(empty) => {
                assert_eq!(empty.following_count, 0);
                assert_eq!(empty.count, 0);
                assert!(empty.posts.is_empty());
                assert_eq!(empty.message, NOT_FOLLOWING_MESSAGE);
            }
            other => panic!("Expected empty feed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_feed_only_contains_followees_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice").await;
        let bob = seed(&store, "bob").await;
        let charlie = seed(&store, "charlie").await;
        let dave = seed(&store, "dave").await;

        post_by(&store, &bob, "bob 1").await;
        post_by(&store, &dave, "dave 1").await;
        post_by(&store, &charlie, "charlie 1").await;
        post_by(&store, &alice, "alice 1").await;
        let liked = post_by(&store, &bob, "bob 2").await;

        store.insert_follow(alice.id, bob.id, None).await.unwrap();
        store.insert_follow(alice.id, charlie.id, None).await.unwrap();
        store.insert_like(alice.id, liked, None).await.unwrap();

        let service = FeedService::new(store.clone());
        let feed = service
            .get_feed(alice.id, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(titles(&feed), vec!["bob 2", "charlie 1", "bob 1"]);

        let Feed::Posts(page) = &feed else {
            panic!("Expected posts");
        };
        assert_eq!(page.following_count, 2);
        assert_eq!(page.count, 3);
        assert!(page.posts[0].is_liked_by_user);
        assert_eq!(page.posts[0].likes_count, 1);
        assert!(!page.posts[1].is_liked_by_user);

        store.delete_follow(alice.id, bob.id).await.unwrap();
        let feed = service
            .get_feed(alice.id, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(titles(&feed), vec!["charlie 1"]);
    }

    #[tokio::test]
    async fn test_feed_pagination() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice").await;
        let bob = seed(&store, "bob").await;
        for i in 0..15 {
            post_by(&store, &bob, &format!("post {}", i)).await;
        }
        store.insert_follow(alice.id, bob.id, None).await.unwrap();

        let service = FeedService::new(store.clone());
        let Feed::Posts(second) = service
            .get_feed(alice.id, PageRequest::new(2, 10))
            .await
            .unwrap()
        else {
            panic!("Expected posts");
        };
        assert_eq!(second.count, 15);
        assert_eq!(second.total_pages, 2);
        assert_eq!(second.posts.len(), 5);
        assert_eq!(second.posts[4].title, "post 0");
    }
}
