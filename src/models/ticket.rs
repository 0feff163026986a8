use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ticket lifecycle on the platform side. `pending` rows exist only between the
/// database insert and the mint confirmation; a mint failure deletes them.
/// `transferred` marks a token held by a wallet with no local account, in which
/// case `user_id` goes stale on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Minted,
    Used,
    Transferred,
}

/// Ticket row joined with the event it admits to, for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TicketWithEvent {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_id: Uuid,
    pub nft_token_id: Option<i64>,
    pub tx_hash: Option<String>,
    pub status: TicketStatus,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
    pub event_venue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub developer_id: Option<Uuid>,
    pub event_id: Uuid,
    pub wallet_address: Option<String>,
    pub nft_token_id: Option<i64>,
    pub tx_hash: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
