use chrono::{DateTime, NaiveDate, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Quota class for third-party developers. The per-day request limit is stored
/// denormalized on the row so an admin can override it per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "developer_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeveloperTier {
    Free,
    Pro,
    Enterprise,
}

impl DeveloperTier {
    pub fn default_request_limit(self) -> i32 {
        match self {
            DeveloperTier::Free => 100,
            DeveloperTier::Pro => 10_000,
            DeveloperTier::Enterprise => 100_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub tier: DeveloperTier,
    pub request_limit: i32,
    pub request_count: i32,
    pub last_request_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const API_KEY_PREFIX: &str = "sk_live_";

/// Opaque API key: prefix plus 24 random bytes in hex. Resolved by exact match.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", API_KEY_PREFIX, hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_has_prefix_and_length() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 48);
    }

    #[test]
    fn api_keys_are_unique() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn free_tier_limit_matches_default() {
        assert_eq!(DeveloperTier::Free.default_request_limit(), 100);
    }
}
