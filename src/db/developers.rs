use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Developer, DeveloperTier};

pub async fn create(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    api_key: &str,
) -> Result<Developer, sqlx::Error> {
    let tier = DeveloperTier::Free;
    sqlx::query_as::<_, Developer>(
        r#"INSERT INTO developers (name, email, password_hash, api_key, tier, request_limit)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING *"#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(api_key)
    .bind(tier)
    .bind(tier.default_request_limit())
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Developer>, sqlx::Error> {
    sqlx::query_as::<_, Developer>("SELECT * FROM developers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Developer>, sqlx::Error> {
    sqlx::query_as::<_, Developer>("SELECT * FROM developers WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// API keys are opaque tokens resolved by exact match.
pub async fn find_by_api_key(pool: &PgPool, api_key: &str) -> Result<Option<Developer>, sqlx::Error> {
    sqlx::query_as::<_, Developer>("SELECT * FROM developers WHERE api_key = $1")
        .bind(api_key)
        .fetch_optional(pool)
        .await
}

/// Swap in a fresh API key; the previous key stops resolving the moment this
/// statement commits.
pub async fn replace_api_key(pool: &PgPool, id: Uuid, api_key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE developers SET api_key = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(api_key)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list(pool: &PgPool) -> Result<Vec<Developer>, sqlx::Error> {
    sqlx::query_as::<_, Developer>("SELECT * FROM developers ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Atomically spend one unit of the daily quota.
///
/// A single guarded UPDATE performs the day-rollover reset and the
/// limit check in one statement, so concurrent requests from the same key
/// cannot overshoot the limit through interleaved read-modify-write.
/// Returns the post-increment count, or `None` when the limit is already
/// reached for `today` (the stored counter is left untouched in that case).
pub async fn consume_quota(
    pool: &PgPool,
    id: Uuid,
    today: NaiveDate,
) -> Result<Option<i32>, sqlx::Error> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"UPDATE developers
           SET request_count = CASE
                   WHEN last_request_date IS DISTINCT FROM $2 THEN 1
                   ELSE request_count + 1
               END,
               last_request_date = $2,
               updated_at = NOW()
           WHERE id = $1
             AND (last_request_date IS DISTINCT FROM $2 OR request_count < request_limit)
           RETURNING request_count"#,
    )
    .bind(id)
    .bind(today)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(count,)| count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn seed_with_limit(pool: &PgPool, limit: i32) -> Developer {
        let dev = create(pool, "Quota Dev", "quota@example.com", "hash", "sk_live_test")
            .await
            .unwrap();
        sqlx::query("UPDATE developers SET request_limit = $2 WHERE id = $1")
            .bind(dev.id)
            .bind(limit)
            .execute(pool)
            .await
            .unwrap();
        find_by_id(pool, dev.id).await.unwrap().unwrap()
    }

    #[sqlx::test]
    async fn quota_counts_up_then_rejects_at_limit(pool: PgPool) {
        let dev = seed_with_limit(&pool, 2).await;
        let today = Utc::now().date_naive();

        assert_eq!(consume_quota(&pool, dev.id, today).await.unwrap(), Some(1));
        assert_eq!(consume_quota(&pool, dev.id, today).await.unwrap(), Some(2));
        assert_eq!(consume_quota(&pool, dev.id, today).await.unwrap(), None);

        // the rejected call must not have touched the stored counter
        let dev = find_by_id(&pool, dev.id).await.unwrap().unwrap();
        assert_eq!(dev.request_count, 2);
        assert_eq!(dev.last_request_date, Some(today));
    }

    #[sqlx::test]
    async fn quota_resets_to_one_on_day_rollover(pool: PgPool) {
        let dev = seed_with_limit(&pool, 1).await;
        let today = Utc::now().date_naive();
        let yesterday = today.pred_opt().unwrap();

        assert_eq!(
            consume_quota(&pool, dev.id, yesterday).await.unwrap(),
            Some(1)
        );
        assert_eq!(consume_quota(&pool, dev.id, yesterday).await.unwrap(), None);

        // very next call on the new day succeeds and starts the count over
        assert_eq!(consume_quota(&pool, dev.id, today).await.unwrap(), Some(1));
        let dev = find_by_id(&pool, dev.id).await.unwrap().unwrap();
        assert_eq!(dev.request_count, 1);
        assert_eq!(dev.last_request_date, Some(today));
    }
}
