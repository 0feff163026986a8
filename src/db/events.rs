use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Event;

pub async fn upcoming(pool: &PgPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE date >= NOW() ORDER BY date ASC")
        .fetch_all(pool)
        .await
}

pub async fn all_by_date(pool: &PgPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY date ASC")
        .fetch_all(pool)
        .await
}

pub async fn all_newest_first(pool: &PgPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    title: &str,
    description: Option<&str>,
    date: DateTime<Utc>,
    venue: &str,
    price: Decimal,
    total_tickets: i32,
) -> Result<Event, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        r#"INSERT INTO events (title, description, date, venue, price, total_tickets, available_tickets)
           VALUES ($1, $2, $3, $4, $5, $6, $6)
           RETURNING *"#,
    )
    .bind(title)
    .bind(description)
    .bind(date)
    .bind(venue)
    .bind(price)
    .bind(total_tickets)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, event: &Event) -> Result<Event, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        r#"UPDATE events
           SET title = $2, description = $3, date = $4, venue = $5, price = $6,
               total_tickets = $7, available_tickets = $8, updated_at = NOW()
           WHERE id = $1
           RETURNING *"#,
    )
    .bind(event.id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.date)
    .bind(&event.venue)
    .bind(event.price)
    .bind(event.total_tickets)
    .bind(event.available_tickets)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Take one ticket off the shelf. The `available_tickets > 0` guard makes the
/// decrement atomic under concurrent mints; zero rows affected means the event
/// raced to sold out.
pub async fn decrement_available(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE events
           SET available_tickets = available_tickets - 1, updated_at = NOW()
           WHERE id = $1 AND available_tickets > 0"#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn decrement_is_guarded_at_zero(pool: PgPool) {
        let event = create(&pool, "Show", None, Utc::now(), "Hall", Decimal::ZERO, 1)
            .await
            .unwrap();
        assert_eq!(event.available_tickets, 1);

        assert!(decrement_available(&pool, event.id).await.unwrap());
        // sold out: further decrements are rejected, the counter stays at zero
        assert!(!decrement_available(&pool, event.id).await.unwrap());
        assert!(!decrement_available(&pool, event.id).await.unwrap());

        let event = find(&pool, event.id).await.unwrap().unwrap();
        assert_eq!(event.available_tickets, 0);
        assert_eq!(event.total_tickets, 1);
    }
}
