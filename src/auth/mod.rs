//! Bearer-token auth shared by the three principal types.

pub mod api_key;
pub mod extract;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::AppError;

pub use api_key::{require_api_key, ApiClient};
pub use extract::{AuthAdmin, AuthDeveloper, AuthUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Developer,
}

impl Role {
    /// Admin sessions are short-lived; user and developer tokens last a week.
    fn token_ttl(self) -> Duration {
        match self {
            Role::Admin => Duration::hours(24),
            Role::User | Role::Developer => Duration::days(7),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Developer => "developer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(secret: &str, id: Uuid, email: &str, role: Role) -> Result<String, AppError> {
    let expiration = Utc::now() + role.token_ttl();
    let claims = Claims {
        id,
        email: email.to_string(),
        role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("token encoding failed: {e}")))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip_preserves_claims() {
        let id = Uuid::new_v4();
        let token = issue_token(SECRET, id, "dev@example.com", Role::Developer).unwrap();
        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.email, "dev@example.com");
        assert_eq!(claims.role, Role::Developer);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4(), "a@b.c", Role::User).unwrap();
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token(SECRET, "not.a.jwt").is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::Developer.as_str(), "developer");
    }
}
