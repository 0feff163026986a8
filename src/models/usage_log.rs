use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApiUsageLog {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub status_code: i32,
    pub response_time_ms: i32,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Usage log row joined with the developer it belongs to, for the admin view.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApiUsageLogWithDeveloper {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub developer_name: String,
    pub developer_email: String,
    pub endpoint: String,
    pub method: String,
    pub status_code: i32,
    pub response_time_ms: i32,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
