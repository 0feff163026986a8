//! API-key gate for the open API tree.
//!
//! Quota accounting happens before the handler runs, so a request that fails
//! inside the handler still consumed one unit. The usage-log row is written on
//! a detached task after the response is produced and any insert failure is
//! swallowed; logging must never alter the response path.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::db;
use crate::models::Developer;
use crate::state::AppState;
use crate::utils::error::AppError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Authenticated open-API caller, stored in request extensions by the gate.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub id: Uuid,
    pub name: String,
}

impl From<&Developer> for ApiClient {
    fn from(dev: &Developer) -> Self {
        Self {
            id: dev.id,
            name: dev.name.clone(),
        }
    }
}

/// The UTC calendar date that buckets daily quotas.
pub fn quota_day() -> NaiveDate {
    Utc::now().date_naive()
}

pub async fn require_api_key(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();

    let developer = match resolve_developer(&state, req.headers()).await {
        Ok(dev) => dev,
        Err(e) => return e.into_response(),
    };

    if let Err(e) = spend_quota(&state, &developer).await {
        return e.into_response();
    }

    let endpoint = req.uri().path().to_string();
    let method = req.method().to_string();
    let ip = client_ip(&req);
    req.extensions_mut().insert(ApiClient::from(&developer));

    let response = next.run(req).await;

    let status = response.status().as_u16() as i32;
    let pool = state.pool.clone();
    let developer_id = developer.id;
    tokio::spawn(async move {
        let elapsed_ms = started.elapsed().as_millis().min(i32::MAX as u128) as i32;
        if let Err(e) = db::usage_logs::insert(
            &pool,
            developer_id,
            &endpoint,
            &method,
            status,
            elapsed_ms,
            ip.as_deref(),
        )
        .await
        {
            warn!(error = %e, %developer_id, "Failed to record API usage");
        }
    });

    response
}

async fn resolve_developer(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<Developer, AppError> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingApiKey)?;

    let developer = db::developers::find_by_api_key(&state.pool, api_key)
        .await?
        .ok_or(AppError::InvalidApiKey)?;

    if !developer.is_active {
        return Err(AppError::AccountDisabled);
    }

    Ok(developer)
}

async fn spend_quota(state: &AppState, developer: &Developer) -> Result<(), AppError> {
    match db::developers::consume_quota(&state.pool, developer.id, quota_day()).await? {
        Some(_count) => Ok(()),
        None => Err(AppError::RateLimitExceeded {
            limit: developer.request_limit,
        }),
    }
}

fn client_ip(req: &Request) -> Option<String> {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(name: &str, value: &str) -> Request {
        axum::http::Request::builder()
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn forwarded_for_takes_first_hop() {
        let req = request_with_header("x-forwarded-for", "203.0.113.9, 10.0.0.1");
        assert_eq!(client_ip(&req).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn falls_back_to_connect_info() {
        let mut req = axum::http::Request::builder().body(Body::empty()).unwrap();
        let addr: SocketAddr = "192.0.2.4:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_ip(&req).as_deref(), Some("192.0.2.4"));
    }

    #[test]
    fn no_ip_when_nothing_present() {
        let req = axum::http::Request::builder().body(Body::empty()).unwrap();
        assert!(client_ip(&req).is_none());
    }
}
