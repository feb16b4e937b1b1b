use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::jwt::Role;

pub const USERNAME_MAX_LEN: usize = 150;
pub const BIO_MAX_LEN: usize = 500;

/// Stored user, without credentials
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub role: Role,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn brief(&self) -> UserBrief {
        UserBrief {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Data needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

/// Author / actor reference embedded in other responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserBrief {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    #[schema(example = "alice")]
    pub username: String,
}

/// Profile of the authenticated user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfileResponse {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub role: Role,
    pub followers_count: u64,
    pub following_count: u64,
    #[schema(value_type = DateTimeWrapper)]
    pub date_joined: DateTime<Utc>,
}

impl UserProfileResponse {
    pub fn new(user: User, counts: FollowCounts) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            role: user.role,
            followers_count: counts.followers,
            following_count: counts.following,
            date_joined: user.date_joined,
        }
    }
}

/// Profile of any user as seen by others
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicProfileResponse {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    pub username: String,
    pub bio: String,
    pub followers_count: u64,
    pub following_count: u64,
    #[schema(value_type = DateTimeWrapper)]
    pub date_joined: DateTime<Utc>,
}

impl PublicProfileResponse {
    pub fn new(user: User, counts: FollowCounts) -> Self {
        Self {
            id: user.id,
            username: user.username,
            bio: user.bio,
            followers_count: counts.followers,
            following_count: counts.following,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    #[schema(example = "Rustacean and hiker")]
    pub bio: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("User not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already in use")]
    EmailTaken,
}
