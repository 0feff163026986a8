//! Admin console: account auth, event CRUD, developer and usage oversight.

use axum::extract::{Json, Path, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{issue_token, AuthAdmin, Role};
use crate::db;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success, success_with_message};

#[derive(Debug, Deserialize)]
pub struct AdminRegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub price: Option<Decimal>,
    pub total_tickets: Option<i32>,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub price: Option<Decimal>,
    pub total_tickets: Option<i32>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<AdminRegisterRequest>,
) -> Result<Response, AppError> {
    let (name, email, password) = match (
        non_empty(payload.name),
        non_empty(payload.email),
        non_empty(payload.password),
    ) {
        (Some(n), Some(e), Some(p)) => (n, e, p),
        _ => {
            return Err(AppError::MissingFields(
                "Name, email, and password are required".to_string(),
            ))
        }
    };

    if db::admins::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::EmailExists);
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("password hashing failed: {e}")))?;
    let admin = db::admins::create(&state.pool, &name, &email, &password_hash).await?;

    Ok(created(json!({
        "adminId": admin.id,
        "message": "Admin registered successfully"
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Response, AppError> {
    let (email, password) = match (non_empty(payload.email), non_empty(payload.password)) {
        (Some(e), Some(p)) => (e, p),
        _ => {
            return Err(AppError::MissingFields(
                "Email and password are required".to_string(),
            ))
        }
    };

    let admin = db::admins::find_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = bcrypt::verify(&password, &admin.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state.config.jwt_secret, admin.id, &admin.email, Role::Admin)?;

    Ok(success(json!({
        "token": token,
        "admin": {
            "id": admin.id,
            "name": admin.name,
            "email": admin.email
        }
    })))
}

pub async fn list_events(
    AuthAdmin(_claims): AuthAdmin,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let events = db::events::all_newest_first(&state.pool).await?;
    Ok(success(json!({ "events": events })))
}

pub async fn create_event(
    AuthAdmin(_claims): AuthAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    let (title, date, venue, price, total_tickets) = match (
        non_empty(payload.title),
        payload.date,
        non_empty(payload.venue),
        payload.price,
        payload.total_tickets,
    ) {
        (Some(t), Some(d), Some(v), Some(p), Some(n)) => (t, d, v, p, n),
        _ => {
            return Err(AppError::MissingFields(
                "Title, date, venue, price, and totalTickets are required".to_string(),
            ))
        }
    };

    if total_tickets <= 0 {
        return Err(AppError::ValidationError(
            "totalTickets must be greater than zero".to_string(),
        ));
    }
    if price < Decimal::ZERO {
        return Err(AppError::ValidationError(
            "price must not be negative".to_string(),
        ));
    }

    let event = db::events::create(
        &state.pool,
        &title,
        payload.description.as_deref(),
        date,
        &venue,
        price,
        total_tickets,
    )
    .await?;

    Ok(created(json!({
        "event": event,
        "message": "Event created successfully"
    })))
}

pub async fn update_event(
    AuthAdmin(_claims): AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Response, AppError> {
    let mut event = db::events::find(&state.pool, id)
        .await?
        .ok_or(AppError::EventNotFound)?;

    if let Some(title) = non_empty(payload.title) {
        event.title = title;
    }
    if let Some(description) = payload.description {
        event.description = Some(description);
    }
    if let Some(date) = payload.date {
        event.date = date;
    }
    if let Some(venue) = non_empty(payload.venue) {
        event.venue = venue;
    }
    if let Some(price) = payload.price {
        if price < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }
        event.price = price;
    }
    if let Some(total) = payload.total_tickets {
        if total <= 0 {
            return Err(AppError::ValidationError(
                "totalTickets must be greater than zero".to_string(),
            ));
        }
        // Changing capacity shifts the unsold pool by the same delta; sold
        // tickets stay sold, so the result is clamped to [0, total].
        let delta = total - event.total_tickets;
        event.available_tickets = (event.available_tickets + delta).clamp(0, total);
        event.total_tickets = total;
    }

    let event = db::events::update(&state.pool, &event).await?;

    Ok(success_with_message(
        json!({ "event": event }),
        "Event updated successfully",
    ))
}

pub async fn delete_event(
    AuthAdmin(_claims): AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    if !db::events::delete(&state.pool, id).await? {
        return Err(AppError::EventNotFound);
    }
    Ok(empty_success("Event deleted successfully"))
}

pub async fn list_developers(
    AuthAdmin(_claims): AuthAdmin,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let developers = db::developers::list(&state.pool).await?;
    Ok(success(json!({ "developers": developers })))
}

pub async fn usage_logs(
    AuthAdmin(_claims): AuthAdmin,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let logs = db::usage_logs::recent_with_developer(&state.pool, 100).await?;
    Ok(success(json!({ "logs": logs })))
}
