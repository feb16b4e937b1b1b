use argon2::{
    password_hash::PasswordVerifier,
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2,
};
use axum::http::StatusCode;
use tracing::{error, info};

use super::jwt::{JwtKeys, Role};
use crate::account::model::{NewUser, User, UserProfileResponse, BIO_MAX_LEN, USERNAME_MAX_LEN};
use crate::account::service::is_valid_email;
use crate::store::{Store, StoreError};

pub const PASSWORD_MIN_LEN: usize = 8;

// Input data structures
pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub bio: Option<String>,
}

pub struct LoginData {
    pub username: String,
    pub password: String,
}

// Result data structure
pub struct AuthResult {
    pub user: UserProfileResponse,
    pub token: String,
}

// Service errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("A user with this username already exists")]
    UsernameTaken,

    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to generate auth token")]
    TokenError,

    #[error("Password hashing failed: {0}")]
    HashingError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::UsernameTaken | Self::EmailTaken => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::TokenError | Self::HashingError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "VALIDATION_ERROR",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Store(_) | Self::TokenError | Self::HashingError(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message; internal failures stay opaque
    pub fn message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

fn validate_registration(data: &RegisterData) -> Result<(), AuthError> {
    if data.username.trim().is_empty() || data.email.trim().is_empty() || data.password.is_empty()
    {
        return Err(AuthError::InvalidInput(
            "Username, email, and password are required".to_string(),
        ));
    }
    if data.username.chars().count() > USERNAME_MAX_LEN {
        return Err(AuthError::InvalidInput(format!(
            "Username cannot exceed {} characters",
            USERNAME_MAX_LEN
        )));
    }
    if !is_valid_email(data.email.trim()) {
        return Err(AuthError::InvalidInput(
            "Enter a valid email address".to_string(),
        ));
    }
    if data.password != data.password_confirm {
        return Err(AuthError::InvalidInput(
            "Password fields didn't match".to_string(),
        ));
    }
    if data.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AuthError::InvalidInput(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    if let Some(bio) = &data.bio {
        if bio.chars().count() > BIO_MAX_LEN {
            return Err(AuthError::InvalidInput(format!(
                "Bio cannot exceed {} characters",
                BIO_MAX_LEN
            )));
        }
    }
    Ok(())
}

async fn issue(store: &dyn Store, keys: &JwtKeys, user: User) -> Result<AuthResult, AuthError> {
    let token = keys.generate_token(&user.id, user.role).map_err(|e| {
        error!("Token generation failed: {}", e);
        AuthError::TokenError
    })?;
    let counts = store.follow_counts(user.id).await?;
    Ok(AuthResult {
        user: UserProfileResponse::new(user, counts),
        token,
    })
}

// User registration service
pub async fn register(
    store: &dyn Store,
    keys: &JwtKeys,
    data: RegisterData,
) -> Result<AuthResult, AuthError> {
    validate_registration(&data)?;

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(data.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            AuthError::HashingError(e.to_string())
        })?
        .to_string();

    let new = NewUser {
        username: data.username.trim().to_string(),
        email: data.email.trim().to_string(),
        password_hash,
        bio: data.bio.unwrap_or_default(),
        role: Role::User,
    };
    let user = match store.create_user(new).await {
        Ok(user) => user,
        Err(StoreError::Duplicate("email")) => return Err(AuthError::EmailTaken),
        Err(StoreError::Duplicate(_)) => return Err(AuthError::UsernameTaken),
        Err(e) => return Err(e.into()),
    };
    info!("User created successfully with ID: {}", user.id);

    issue(store, keys, user).await
}

// User login service
pub async fn login(
    store: &dyn Store,
    keys: &JwtKeys,
    data: LoginData,
) -> Result<AuthResult, AuthError> {
    info!("Attempting login for user: {}", data.username);

    let (user, password_hash) = store
        .find_credentials(data.username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&password_hash).map_err(|e| {
        error!("Stored password hash is malformed: {}", e);
        AuthError::HashingError(e.to_string())
    })?;
    Argon2::default()
        .verify_password(data.password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)?;

    info!("User {} logged in", user.id);
    issue(store, keys, user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    fn keys() -> JwtKeys {
        JwtKeys::new("test_secret", 1)
    }

    fn registration(username: &str, email: &str) -> RegisterData {
        RegisterData {
            username: username.to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            password_confirm: "correct horse".to_string(),
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let keys = keys();

        let registered = register(&store, &keys, registration("alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(registered.user.username, "alice");
        assert_eq!(registered.user.role, Role::User);
        let claims = keys.validate_token(&registered.token).unwrap();
        assert_eq!(Uuid::parse_str(&claims.sub).unwrap(), registered.user.id);

        let logged_in = login(
            &store,
            &keys,
            LoginData {
                username: "alice".to_string(),
                password: "correct horse".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let err = login(
            &store,
            &keys,
            LoginData {
                username: "alice".to_string(),
                password: "wrong password".to_string(),
            },
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let keys = keys();

        let mut mismatch = registration("alice", "alice@example.com");
        mismatch.password_confirm = "something else".to_string();
        let err = register(&store, &keys, mismatch).await.err().unwrap();
        assert!(matches!(err, AuthError::InvalidInput(_)));

        let mut short = registration("alice", "alice@example.com");
        short.password = "short".to_string();
        short.password_confirm = "short".to_string();
        let err = register(&store, &keys, short).await.err().unwrap();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = register(&store, &keys, registration("", "alice@example.com"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_duplicates() {
        let store = MemoryStore::new();
        let keys = keys();
        register(&store, &keys, registration("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = register(&store, &keys, registration("alice", "other@example.com"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::UsernameTaken));

        let err = register(&store, &keys, registration("alice2", "alice@example.com"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(err.code(), "EMAIL_TAKEN");
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err = AuthError::HashingError("salt exploded".to_string());
        assert_eq!(err.message(), "Internal server error");
        assert_eq!(
            AuthError::InvalidCredentials.message(),
            "Invalid username or password"
        );
    }
}
