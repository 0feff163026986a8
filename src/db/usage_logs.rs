use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ApiUsageLog, ApiUsageLogWithDeveloper};

pub async fn insert(
    pool: &PgPool,
    developer_id: Uuid,
    endpoint: &str,
    method: &str,
    status_code: i32,
    response_time_ms: i32,
    ip_address: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO api_usage_logs
               (developer_id, endpoint, method, status_code, response_time_ms, ip_address)
           VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(developer_id)
    .bind(endpoint)
    .bind(method)
    .bind(status_code)
    .bind(response_time_ms)
    .bind(ip_address)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn recent_for_developer(
    pool: &PgPool,
    developer_id: Uuid,
    limit: i64,
) -> Result<Vec<ApiUsageLog>, sqlx::Error> {
    sqlx::query_as::<_, ApiUsageLog>(
        r#"SELECT * FROM api_usage_logs
           WHERE developer_id = $1
           ORDER BY created_at DESC
           LIMIT $2"#,
    )
    .bind(developer_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn recent_with_developer(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ApiUsageLogWithDeveloper>, sqlx::Error> {
    sqlx::query_as::<_, ApiUsageLogWithDeveloper>(
        r#"SELECT l.id, l.developer_id, d.name AS developer_name, d.email AS developer_email,
                  l.endpoint, l.method, l.status_code, l.response_time_ms, l.ip_address, l.created_at
           FROM api_usage_logs l
           JOIN developers d ON d.id = l.developer_id
           ORDER BY l.created_at DESC
           LIMIT $1"#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
