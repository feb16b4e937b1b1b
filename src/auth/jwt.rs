use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// User roles for role-based access control
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn from_str(role: &str) -> Result<Self, String> {
        match role.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", role)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// Signing material and token lifetime, built from `AppConfig`
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys").field("ttl", &self.ttl).finish()
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user_id: &Uuid, role: Role) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiry = now + self.ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: expiry.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| JwtError::TokenCreation)
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| JwtError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create JWT token")]
    TokenCreation,
    #[error("Invalid or expired JWT token")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn keys() -> JwtKeys {
        JwtKeys::new("test_secret", 24)
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert!(Role::from_str("author").is_err());
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn test_jwt_token_generation_and_validation() {
        let keys = keys();
        let user_id = Uuid::new_v4();

        let token = keys
            .generate_token(&user_id, Role::User)
            .expect("Token generation failed");
        assert!(!token.is_empty());

        let claims = keys.validate_token(&token).expect("Token validation failed");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn test_jwt_error_messages() {
        assert_eq!(
            JwtError::InvalidToken.to_string(),
            "Invalid or expired JWT token"
        );
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let user_id = Uuid::new_v4();
        let token = JwtKeys::new("another_secret", 24)
            .generate_token(&user_id, Role::User)
            .unwrap();

        match keys().validate_token(&token) {
            Err(JwtError::InvalidToken) => {}
            _ => panic!("Expected InvalidToken error"),
        }
    }

    #[test]
    fn test_token_tampering() {
        let keys = keys();
        let token = keys.generate_token(&Uuid::new_v4(), Role::User).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3, "JWT should have 3 parts");

        let tampered_token = format!("{}.{}tampered.{}", parts[0], parts[1], parts[2]);
        assert!(matches!(
            keys.validate_token(&tampered_token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let keys = keys();
        let malformed_tokens = [
            "",
            "not.a.jwt.token",
            "missing.segments",
            "invalid base64.parts.here",
            "eyJhbGciOiJIUzI1NiJ9",
        ];

        for token in &malformed_tokens {
            assert!(
                matches!(keys.validate_token(token), Err(JwtError::InvalidToken)),
                "Token '{}' should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_expired_token_rejection() {
        let keys = JwtKeys::new("test_secret", -1);
        let token = keys.generate_token(&Uuid::new_v4(), Role::User).unwrap();
        assert!(matches!(
            keys.validate_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_claims_issued_and_expiry_times() {
        let keys = keys();
        let now = Utc::now().timestamp() as usize;
        let token = keys.generate_token(&Uuid::new_v4(), Role::Admin).unwrap();
        let claims = keys.validate_token(&token).unwrap();

        assert!(claims.iat <= now + 1 && claims.iat + 1 >= now);
        let expected_expiry = now + 24 * 60 * 60;
        assert!(claims.exp <= expected_expiry + 5 && claims.exp + 5 >= expected_expiry);
    }

    #[test]
    fn test_token_validation_concurrency() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.generate_token(&user_id, Role::User).unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let keys = keys.clone();
                let token = token.clone();
                thread::spawn(move || {
                    let claims = keys.validate_token(&token).unwrap();
                    assert_eq!(claims.sub, user_id.to_string());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
