use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub venue: String,
    pub price: Decimal,
    pub total_tickets: i32,
    pub available_tickets: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
