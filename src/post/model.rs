use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::account::model::UserBrief;

pub const TITLE_MAX_LEN: usize = 200;
pub const POSTS_PER_PAGE: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: UserBrief,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Derived per-post figures; never stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostStats {
    pub comments_count: u64,
    pub likes_count: u64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrdering {
    #[default]
    NewestFirst,
    OldestFirst,
    RecentlyUpdated,
    LeastRecentlyUpdated,
}

impl PostOrdering {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "-created_at" => Some(Self::NewestFirst),
            "created_at" => Some(Self::OldestFirst),
            "-updated_at" => Some(Self::RecentlyUpdated),
            "updated_at" => Some(Self::LeastRecentlyUpdated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author: Option<Uuid>,
    pub search: Option<String>,
    pub ordering: PostOrdering,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Only posts written by this user
    #[param(value_type = Option<String>)]
    pub author: Option<Uuid>,
    /// Case-insensitive match against title and content
    pub search: Option<String>,
    /// One of `created_at`, `-created_at`, `updated_at`, `-updated_at`
    pub ordering: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    #[schema(example = "Hello from Bob")]
    pub title: String,
    #[schema(example = "This is my first post.")]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: UserBrief,
    pub comments_count: u64,
    pub likes_count: u64,
    pub is_liked_by_user: bool,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn new(post: Post, stats: PostStats) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author: post.author,
            comments_count: stats.comments_count,
            likes_count: stats.likes_count,
            is_liked_by_user: stats.is_liked,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostListResponse {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub results: Vec<PostResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeResponse {
    #[schema(example = "Post liked successfully")]
    pub message: String,
    pub liked: bool,
    pub likes_count: u64,
}

/// Returned with 400 when unliking a post the caller never liked
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeErrorResponse {
    pub error: String,
    pub code: String,
    pub likes_count: u64,
}
