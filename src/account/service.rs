use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::account::model::{
    AccountError, ProfileUpdate, PublicProfileResponse, UpdateProfileRequest, User,
    UserProfileResponse, BIO_MAX_LEN,
};
use crate::store::{Store, StoreError};

/// Dot-atom local part, then dotted hostname labels and a TLD of at least two characters
const EMAIL_PATTERN: &str = r#"(?i)^[-!#$%&'*+/=?^_`{}|~0-9a-z]+(?:\.[-!#$%&'*+/=?^_`{}|~0-9a-z]+)*@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9-]{1,62}[a-z0-9]$"#;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

/// Shape check only; deliverability is not our concern
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<User, AccountError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfileResponse, AccountError> {
        let user = self.find_user(user_id).await?;
        let counts = self.store.follow_counts(user_id).await?;
        Ok(UserProfileResponse::new(user, counts))
    }

    pub async fn public_profile(
        &self,
        user_id: Uuid,
    ) -> Result<PublicProfileResponse, AccountError> {
        let user = self.find_user(user_id).await?;
        let counts = self.store.follow_counts(user_id).await?;
        Ok(PublicProfileResponse::new(user, counts))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserProfileResponse, AccountError> {
        let email = request.email.map(|e| e.trim().to_string());
        if let Some(email) = &email {
            if !is_valid_email(email) {
                return Err(AccountError::Validation(
                    "Enter a valid email address".to_string(),
                ));
            }
        }
        if let Some(bio) = &request.bio {
            if bio.chars().count() > BIO_MAX_LEN {
                return Err(AccountError::Validation(format!(
                    "Bio cannot exceed {} characters",
                    BIO_MAX_LEN
                )));
            }
        }

        let update = ProfileUpdate {
            email,
            bio: request.bio,
        };
        let user = match self.store.update_profile(user_id, update).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AccountError::NotFound),
            Err(StoreError::Duplicate(_)) => return Err(AccountError::EmailTaken),
            Err(e) => return Err(e.into()),
        };
        info!("Updated profile of user {}", user_id);

        let counts = self.store.follow_counts(user_id).await?;
        Ok(UserProfileResponse::new(user, counts))
    }

    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AccountError> {
        if !self.store.delete_user(user_id).await? {
            return Err(AccountError::NotFound);
        }
        info!("Deleted account {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::model::NewUser;
    use crate::auth::jwt::Role;
    use crate::store::{MemoryStore, UserRepository};

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

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@localhost"));
        assert!(is_valid_email("first.last+tag@mail.example.co"));
        assert!(!is_valid_email("a@b@c.d"));
        assert!(!is_valid_email("a@."));
        assert!(!is_valid_email("a@.example.com"));
        assert!(!is_valid_email(".alice@example.com"));
        assert!(!is_valid_email("alice@example-.com"));
        assert!(!is_valid_email("al ice@example.com"));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice").await;
        seed(&store, "bob").await;
        let service = AccountService::new(store.clone());

        let updated = service
            .update_profile(
                alice.id,
                UpdateProfileRequest {
                    email: None,
                    bio: Some("Hiking and Rust".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio, "Hiking and Rust");
        assert_eq!(updated.email, "alice@example.com");

        let err = service
            .update_profile(
                alice.id,
                UpdateProfileRequest {
                    email: Some("bob@example.com".to_string()),
                    bio: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));

        let err = service
            .update_profile(
                alice.id,
                UpdateProfileRequest {
                    email: None,
                    bio: Some("x".repeat(BIO_MAX_LEN + 1)),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let store = Arc::new(MemoryStore::new());
        let alice = seed(&store, "alice").await;
        let service = AccountService::new(store.clone());

        service.delete_account(alice.id).await.unwrap();
        assert!(matches!(
            service.profile(alice.id).await,
            Err(AccountError::NotFound)
        ));
        assert!(matches!(
            service.delete_account(alice.id).await,
            Err(AccountError::NotFound)
        ));
    }
}
