use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

pub async fn create(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"INSERT INTO users (name, email, password_hash)
           VALUES ($1, $2, $3)
           RETURNING *"#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Wallet lookup is always case-insensitive; the stored value is checksummed
/// but callers may pass any casing.
pub async fn find_by_wallet(pool: &PgPool, wallet: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE LOWER(wallet_address) = LOWER($1)",
    )
    .bind(wallet)
    .fetch_optional(pool)
    .await
}

pub async fn set_wallet(pool: &PgPool, id: Uuid, wallet: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET wallet_address = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(wallet)
        .execute(pool)
        .await?;
    Ok(())
}
