use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Ticket, TicketStatus, TicketWithEvent};

/// Insert the auditable `pending` row before anything touches the chain.
pub async fn insert_pending(
    pool: &PgPool,
    user_id: Option<Uuid>,
    developer_id: Option<Uuid>,
    event_id: Uuid,
    wallet_address: Option<&str>,
) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        r#"INSERT INTO tickets (user_id, developer_id, event_id, wallet_address, status)
           VALUES ($1, $2, $3, $4, 'pending')
           RETURNING *"#,
    )
    .bind(user_id)
    .bind(developer_id)
    .bind(event_id)
    .bind(wallet_address)
    .fetch_one(pool)
    .await
}

pub async fn mark_minted(
    pool: &PgPool,
    id: Uuid,
    token_id: i64,
    tx_hash: &str,
) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        r#"UPDATE tickets
           SET nft_token_id = $2, tx_hash = $3, status = 'minted', updated_at = NOW()
           WHERE id = $1
           RETURNING *"#,
    )
    .bind(id)
    .bind(token_id)
    .bind(tx_hash)
    .fetch_one(pool)
    .await
}

/// Compensating action for a failed mint.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_owned_minted(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE id = $1 AND user_id = $2 AND status = 'minted'",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_owned(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_token(pool: &PgPool, token_id: i64) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE nft_token_id = $1")
        .bind(token_id)
        .fetch_optional(pool)
        .await
}

/// All minted tickets that made it on chain, the reconciliation scan set.
pub async fn minted_with_token(pool: &PgPool) -> Result<Vec<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE status = 'minted' AND nft_token_id IS NOT NULL",
    )
    .fetch_all(pool)
    .await
}

pub async fn minted_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<TicketWithEvent>, sqlx::Error> {
    sqlx::query_as::<_, TicketWithEvent>(
        r#"SELECT t.id, t.user_id, t.event_id, t.nft_token_id, t.tx_hash, t.status,
                  e.title AS event_title, e.date AS event_date, e.venue AS event_venue
           FROM tickets t
           JOIN events e ON e.id = t.event_id
           WHERE t.user_id = $1 AND t.status = 'minted'
           ORDER BY t.created_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn reassign_owner(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    status: TicketStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tickets SET user_id = $2, status = $3, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(user_id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_status(pool: &PgPool, id: Uuid, status: TicketStatus) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tickets SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_tx_hash(pool: &PgPool, id: Uuid, tx_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tickets SET tx_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(tx_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Record a new holder wallet for a token (open-API transfer: the on-chain
/// move is the wallet owner's job, we only mirror it).
pub async fn set_holder_wallet(pool: &PgPool, id: Uuid, wallet: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tickets SET wallet_address = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(wallet)
        .execute(pool)
        .await?;
    Ok(())
}
