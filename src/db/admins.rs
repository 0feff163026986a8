use sqlx::PgPool;

use crate::models::Admin;

pub async fn create(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<Admin, sqlx::Error> {
    sqlx::query_as::<_, Admin>(
        r#"INSERT INTO admins (name, email, password_hash)
           VALUES ($1, $2, $3)
           RETURNING *"#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}
