use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::account::model::{PublicProfileResponse, UserBrief};
use crate::store::StoreError;

/// Result of a follow or unfollow, with the target's refreshed counts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowStateResponse {
    #[schema(example = "You are now following bob")]
    pub message: String,
    pub user: PublicProfileResponse,
    pub is_following: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowersResponse {
    pub user: UserBrief,
    pub followers_count: u64,
    pub followers: Vec<UserBrief>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowingResponse {
    pub user: UserBrief,
    pub following_count: u64,
    pub following: Vec<UserBrief>,
}

#[derive(Debug, thiserror::Error)]
pub enum FollowError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("You cannot follow yourself")]
    SelfFollow,

    #[error("User not found")]
    UserNotFound,

    #[error("You are already following {0}")]
    AlreadyFollowing(String),

    #[error("You are not following {0}")]
    NotFollowing(String),
}
