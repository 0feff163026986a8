//! User registration, login and wallet connection.

use axum::extract::{Json, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{issue_token, AuthUser, Role};
use crate::db;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};
use crate::web3::normalize_address;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectWalletRequest {
    pub wallet_address: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
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

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::EmailExists);
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("password hashing failed: {e}")))?;
    let user = db::users::create(&state.pool, &name, &email, &password_hash).await?;

    Ok(created(json!({
        "userId": user.id,
        "message": "User registered successfully"
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (email, password) = match (non_empty(payload.email), non_empty(payload.password)) {
        (Some(e), Some(p)) => (e, p),
        _ => {
            return Err(AppError::MissingFields(
                "Email and password are required".to_string(),
            ))
        }
    };

    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = bcrypt::verify(&password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state.config.jwt_secret, user.id, &user.email, Role::User)?;

    Ok(success(json!({
        "token": token,
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "walletAddress": user.wallet_address
        }
    })))
}

pub async fn connect_wallet(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ConnectWalletRequest>,
) -> Result<Response, AppError> {
    let wallet = non_empty(payload.wallet_address)
        .ok_or_else(|| AppError::MissingFields("walletAddress is required".to_string()))?;

    let normalized = normalize_address(&wallet)
        .map_err(|_| AppError::ValidationError(format!("Invalid wallet address: {wallet}")))?;

    // Same wallet on two accounts would make ownership reconciliation ambiguous
    if let Some(existing) = db::users::find_by_wallet(&state.pool, &normalized).await? {
        if existing.id != claims.id {
            return Err(AppError::WalletTaken);
        }
    }

    db::users::set_wallet(&state.pool, claims.id, &normalized).await?;

    Ok(empty_success("Wallet connected successfully"))
}
