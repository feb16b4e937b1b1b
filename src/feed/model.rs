use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::post::model::PostResponse;
use crate::store::StoreError;

/// Home timeline page built from the accounts the caller follows
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedResponse {
    pub following_count: u64,
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub posts: Vec<PostResponse>,
}

/// Returned instead of a page when the caller follows nobody
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmptyFeedResponse {
    #[schema(example = "You are not following anyone yet. Follow some users to see their posts!")]
    pub message: String,
    pub following_count: u64,
    pub count: u64,
    pub posts: Vec<PostResponse>,
}

#[derive(Debug)]
pub enum Feed {
    Posts(FeedResponse),
    NotFollowingAnyone(EmptyFeedResponse),
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
