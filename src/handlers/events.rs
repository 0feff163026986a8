//! Public event listings.

use axum::extract::{Path, State};
use axum::response::Response;
use serde_json::json;
use uuid::Uuid;

use crate::db;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn list(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = db::events::upcoming(&state.pool).await?;
    Ok(success(json!({ "events": events })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = db::events::find(&state.pool, id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    Ok(success(json!({ "event": event })))
}
