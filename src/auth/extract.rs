//! Axum extractors for the three bearer-token principals. Role is carried in
//! the token claims; handlers that need the backing row load it themselves.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::state::AppState;
use crate::utils::error::AppError;

use super::{verify_token, Claims, Role};

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::AuthError("No token provided".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthError("No token provided".to_string()))?;

    verify_token(&state.config.jwt_secret, token)
}

fn require_role(claims: Claims, role: Role) -> Result<Claims, AppError> {
    if claims.role != role {
        return Err(AppError::Forbidden(format!(
            "{} access required",
            role.as_str()
        )));
    }
    Ok(claims)
}

pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        Ok(AuthUser(require_role(claims, Role::User)?))
    }
}

pub struct AuthAdmin(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        Ok(AuthAdmin(require_role(claims, Role::Admin)?))
    }
}

pub struct AuthDeveloper(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthDeveloper {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        Ok(AuthDeveloper(require_role(claims, Role::Developer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(role: Role) -> Claims {
        Claims {
            id: Uuid::new_v4(),
            email: "x@y.z".to_string(),
            role,
            exp: 0,
        }
    }

    #[test]
    fn matching_role_passes() {
        assert!(require_role(claims(Role::Admin), Role::Admin).is_ok());
    }

    #[test]
    fn mismatched_role_is_forbidden() {
        let err = require_role(claims(Role::User), Role::Admin).unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }
}
