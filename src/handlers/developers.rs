//! Developer portal: account auth, API-key management and usage introspection.

use axum::extract::{Json, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use crate::auth::api_key::quota_day;
use crate::auth::{issue_token, AuthDeveloper, Role};
use crate::db;
use crate::models::{generate_api_key, Developer};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success, success_with_message};

#[derive(Debug, Deserialize)]
pub struct DeveloperRegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeveloperLoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Requests spent today. The stored counter is only meaningful when the
/// stored date is today; an older date means the day rolled over unused.
fn used_today(dev: &Developer) -> i32 {
    if dev.last_request_date == Some(quota_day()) {
        dev.request_count
    } else {
        0
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<DeveloperRegisterRequest>,
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

    if db::developers::find_by_email(&state.pool, &email)
        .await?
        .is_some()
    {
        return Err(AppError::EmailExists);
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("password hashing failed: {e}")))?;
    let api_key = generate_api_key();
    let developer =
        db::developers::create(&state.pool, &name, &email, &password_hash, &api_key).await?;

    // The key is shown here and on login; it is never serialized with the row.
    Ok(created(json!({
        "developerId": developer.id,
        "apiKey": developer.api_key,
        "tier": developer.tier,
        "requestLimit": developer.request_limit,
        "message": "Developer account created. Keep your API key safe!"
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<DeveloperLoginRequest>,
) -> Result<Response, AppError> {
    let (email, password) = match (non_empty(payload.email), non_empty(payload.password)) {
        (Some(e), Some(p)) => (e, p),
        _ => {
            return Err(AppError::MissingFields(
                "Email and password are required".to_string(),
            ))
        }
    };

    let developer = db::developers::find_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = bcrypt::verify(&password, &developer.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }
    if !developer.is_active {
        return Err(AppError::AccountDisabled);
    }

    let token = issue_token(
        &state.config.jwt_secret,
        developer.id,
        &developer.email,
        Role::Developer,
    )?;

    Ok(success(json!({
        "token": token,
        "developer": {
            "id": developer.id,
            "name": developer.name,
            "email": developer.email,
            "apiKey": developer.api_key,
            "tier": developer.tier,
            "requestLimit": developer.request_limit,
            "requestCount": used_today(&developer)
        }
    })))
}

pub async fn me(
    AuthDeveloper(claims): AuthDeveloper,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let developer = db::developers::find_by_id(&state.pool, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Developer not found".to_string()))?;

    Ok(success(json!({
        "developer": {
            "id": developer.id,
            "name": developer.name,
            "email": developer.email,
            "apiKey": developer.api_key,
            "tier": developer.tier,
            "requestLimit": developer.request_limit,
            "requestCount": used_today(&developer),
            "isActive": developer.is_active,
            "createdAt": developer.created_at
        }
    })))
}

pub async fn regenerate_key(
    AuthDeveloper(claims): AuthDeveloper,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let developer = db::developers::find_by_id(&state.pool, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Developer not found".to_string()))?;

    let api_key = generate_api_key();
    db::developers::replace_api_key(&state.pool, developer.id, &api_key).await?;

    Ok(success_with_message(
        json!({ "apiKey": api_key }),
        "API key regenerated. The old key is no longer valid.",
    ))
}

pub async fn usage(
    AuthDeveloper(claims): AuthDeveloper,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let developer = db::developers::find_by_id(&state.pool, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Developer not found".to_string()))?;

    let used = used_today(&developer);
    let logs = db::usage_logs::recent_for_developer(&state.pool, developer.id, 10).await?;

    Ok(success(json!({
        "usage": {
            "tier": developer.tier,
            "requestLimit": developer.request_limit,
            "requestsToday": used,
            "remainingToday": (developer.request_limit - used).max(0)
        },
        "recentRequests": logs
    })))
}
