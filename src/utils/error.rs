use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing fields: {0}")]
    MissingFields(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("X-API-Key header is required")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Account has been disabled")]
    AccountDisabled,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded. Your limit is {limit} requests per day.")]
    RateLimitExceeded { limit: i32 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Event not found")]
    EventNotFound,

    #[error("Transaction not found: {0}")]
    TxNotFound(String),

    #[error("Email already registered")]
    EmailExists,

    #[error("This wallet is already connected to another account")]
    WalletTaken,

    #[error("No tickets available for this event")]
    SoldOut,

    #[error("Failed to mint NFT: {0}")]
    MintFailed(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingFields(_)
            | AppError::SoldOut => StatusCode::BAD_REQUEST,
            AppError::AuthError(_)
            | AppError::InvalidToken
            | AppError::InvalidCredentials
            | AppError::MissingApiKey
            | AppError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AppError::AccountDisabled | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) | AppError::EventNotFound | AppError::TxNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::EmailExists | AppError::WalletTaken => StatusCode::CONFLICT,
            AppError::MintFailed(_)
            | AppError::TransferFailed(_)
            | AppError::VerificationFailed(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::MissingFields(_) => "MISSING_FIELDS",
            AppError::AuthError(_) => "UNAUTHORIZED",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::MissingApiKey => "MISSING_API_KEY",
            AppError::InvalidApiKey => "INVALID_API_KEY",
            AppError::AccountDisabled => "ACCOUNT_DISABLED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::EventNotFound => "EVENT_NOT_FOUND",
            AppError::TxNotFound(_) => "TX_NOT_FOUND",
            AppError::EmailExists => "EMAIL_EXISTS",
            AppError::WalletTaken => "WALLET_TAKEN",
            AppError::SoldOut => "SOLD_OUT",
            AppError::MintFailed(_) => "MINT_FAILED",
            AppError::TransferFailed(_) => "TRANSFER_FAILED",
            AppError::VerificationFailed(_) => "VERIFICATION_FAILED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "SERVER_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        match &self {
            AppError::DatabaseError(e) => error!(error = ?e, "Database error"),
            AppError::InternalServerError(msg) => error!(message = %msg, "Internal error"),
            other => error!(error = %other, code, "Request failed"),
        }

        // Only expose high-level messages to the client
        let public_message = match &self {
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        error_response(code, public_message, None, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_429() {
        let err = AppError::RateLimitExceeded { limit: 100 };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code(), "RATE_LIMIT_EXCEEDED");
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn api_key_errors_map_to_expected_codes() {
        assert_eq!(AppError::MissingApiKey.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::MissingApiKey.code(), "MISSING_API_KEY");
        assert_eq!(AppError::InvalidApiKey.code(), "INVALID_API_KEY");
        assert_eq!(AppError::AccountDisabled.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn database_error_is_not_exposed() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
