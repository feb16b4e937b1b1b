use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::account::model::UserBrief;
use crate::store::StoreError;

pub const COMMENT_MAX_LEN: usize = 5000;
pub const COMMENTS_PER_PAGE: u64 = 10;

/// Stored comment with its author resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author: UserBrief,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub post: Option<i64>,
    pub author: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Only comments on this post
    pub post: Option<i64>,
    /// Only comments written by this user
    #[param(value_type = Option<String>)]
    pub author: Option<Uuid>,
    /// Case-insensitive match against the content
    pub search: Option<String>,
}

/// Request to create a new comment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCommentRequest {
    /// ID of the post being commented on
    #[schema(example = "42")]
    pub post: i64,

    #[schema(example = "Great post! I really liked it.")]
    pub content: String,
}

/// Body for `PATCH /api/comments/{id}`
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Response format for a single comment
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    #[schema(example = "123")]
    pub id: i64,

    #[schema(example = "42")]
    pub post: i64,

    pub author: UserBrief,

    pub content: String,

    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post: comment.post_id,
            author: comment.author,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Response for a list of comments
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentsListResponse {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub results: Vec<CommentResponse>,
}

/// Possible comment errors
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Comment not found")]
    NotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
