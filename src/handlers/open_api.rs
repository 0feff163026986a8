//! Key-authenticated open API for third-party integrations.
//!
//! Every route in this tree sits behind the API-key gate, which resolves the
//! caller into an [`ApiClient`] extension and spends quota before the handler
//! runs.

use axum::extract::{Extension, Json, Path, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::auth::api_key::ApiClient;
use crate::db;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success, success_with_message};
use crate::web3::{normalize_address, ChainError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub event_id: Option<Uuid>,
    pub recipient_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTransferRequest {
    pub token_id: Option<i64>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
}

/// Validate the transfer payload: all three fields are required, both
/// addresses must parse, and each comes back checksummed.
fn validate_transfer(payload: OpenTransferRequest) -> Result<(i64, String, String), AppError> {
    let (token_id, from_address, to_address) = match (
        payload.token_id,
        payload.from_address,
        payload.to_address,
    ) {
        (Some(t), Some(f), Some(a)) if !f.trim().is_empty() && !a.trim().is_empty() => (t, f, a),
        _ => {
            return Err(AppError::MissingFields(
                "tokenId, fromAddress, and toAddress are required".to_string(),
            ))
        }
    };

    let from_wallet = normalize_address(&from_address)
        .map_err(|_| AppError::ValidationError(format!("Invalid wallet address: {from_address}")))?;
    let to_wallet = normalize_address(&to_address)
        .map_err(|_| AppError::ValidationError(format!("Invalid wallet address: {to_address}")))?;

    Ok((token_id, from_wallet, to_wallet))
}

pub async fn get_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = db::events::all_by_date(&state.pool).await?;
    Ok(success(json!({ "events": events })))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = db::events::find(&state.pool, id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    Ok(success(json!({ "event": event })))
}

pub async fn mint_ticket(
    Extension(client): Extension<ApiClient>,
    State(state): State<AppState>,
    Json(payload): Json<MintRequest>,
) -> Result<Response, AppError> {
    let (event_id, recipient) = match (payload.event_id, payload.recipient_address) {
        (Some(e), Some(r)) if !r.trim().is_empty() => (e, r),
        _ => {
            return Err(AppError::MissingFields(
                "eventId and recipientAddress are required".to_string(),
            ))
        }
    };

    let recipient = normalize_address(&recipient)
        .map_err(|_| AppError::ValidationError(format!("Invalid wallet address: {recipient}")))?;

    let event = db::events::find(&state.pool, event_id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    if event.available_tickets <= 0 {
        return Err(AppError::SoldOut);
    }

    tracing::info!(
        developer_id = %client.id,
        developer = %client.name,
        event_id = %event.id,
        "Open API mint requested"
    );

    let ticket = db::tickets::insert_pending(
        &state.pool,
        None,
        Some(client.id),
        event.id,
        Some(&recipient),
    )
    .await?;

    let receipt = match state.chain.mint_ticket(&recipient, &event.title).await {
        Ok(receipt) => receipt,
        Err(e) => {
            db::tickets::delete(&state.pool, ticket.id).await?;
            return Err(AppError::MintFailed(e.to_string()));
        }
    };

    let ticket =
        db::tickets::mark_minted(&state.pool, ticket.id, receipt.token_id, &receipt.tx_hash)
            .await?;

    if !db::events::decrement_available(&state.pool, event.id).await? {
        warn!(event_id = %event.id, ticket_id = %ticket.id, "Mint succeeded with no available ticket to decrement");
    }

    Ok(created(json!({
        "ticket": {
            "id": ticket.id,
            "eventId": event.id,
            "eventName": event.title,
            "nftTokenId": receipt.token_id,
            "txHash": receipt.tx_hash,
            "recipientAddress": recipient
        },
        "message": "Ticket minted successfully"
    })))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(token_id): Path<i64>,
) -> Result<Response, AppError> {
    let ticket = db::tickets::find_by_token(&state.pool, token_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;
    let event = db::events::find(&state.pool, ticket.event_id).await?;

    Ok(success(json!({
        "ticket": ticket,
        "event": event
    })))
}

pub async fn verify_ticket(
    State(state): State<AppState>,
    Path(token_id): Path<i64>,
) -> Result<Response, AppError> {
    let verification = state
        .chain
        .verify_ticket(token_id)
        .await
        .map_err(|e| AppError::VerificationFailed(e.to_string()))?;

    // Cross-check the chain's answer against our records; a mismatch means the
    // token moved outside the platform and the row has not caught up yet.
    let ticket = db::tickets::find_by_token(&state.pool, token_id).await?;
    let recorded_wallet = ticket.as_ref().and_then(|t| t.wallet_address.clone());
    let matches_record = match (&verification.owner, &recorded_wallet) {
        (Some(owner), Some(recorded)) => Some(owner.eq_ignore_ascii_case(recorded)),
        _ => None,
    };

    Ok(success(json!({
        "valid": verification.is_valid,
        "owner": verification.owner,
        "eventName": verification.event_name,
        "knownToPlatform": ticket.is_some(),
        "matchesRecord": matches_record,
        "error": verification.error
    })))
}

/// Record a transfer that the token holder performed on chain themselves. The
/// platform key cannot move third-party tokens, so no gateway call is made;
/// the row just mirrors the new holder wallet.
pub async fn transfer_ticket(
    State(state): State<AppState>,
    Json(payload): Json<OpenTransferRequest>,
) -> Result<Response, AppError> {
    let (token_id, from_wallet, to_wallet) = validate_transfer(payload)?;

    let ticket = db::tickets::find_by_token(&state.pool, token_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    db::tickets::set_holder_wallet(&state.pool, ticket.id, &to_wallet).await?;

    Ok(success_with_message(
        json!({
            "tokenId": token_id,
            "previousHolder": from_wallet,
            "newHolder": to_wallet
        }),
        "Transfer recorded",
    ))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> Result<Response, AppError> {
    let status = state
        .chain
        .transaction_status(&tx_hash)
        .await
        .map_err(|e| match e {
            ChainError::TxNotFound(hash) => AppError::TxNotFound(hash),
            ChainError::InvalidTxHash(hash) => AppError::TxNotFound(hash),
            other => AppError::InternalServerError(other.to_string()),
        })?;

    Ok(success(json!({ "transaction": status })))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET_A: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
    const WALLET_B: &str = "0x0000000000000000000000000000000000000001";

    fn payload(token_id: Option<i64>, from: Option<&str>, to: Option<&str>) -> OpenTransferRequest {
        OpenTransferRequest {
            token_id,
            from_address: from.map(str::to_string),
            to_address: to.map(str::to_string),
        }
    }

    #[test]
    fn transfer_requires_all_three_fields() {
        for p in [
            payload(None, Some(WALLET_A), Some(WALLET_B)),
            payload(Some(1), None, Some(WALLET_B)),
            payload(Some(1), Some(WALLET_A), None),
            payload(Some(1), Some("  "), Some(WALLET_B)),
        ] {
            let err = validate_transfer(p).unwrap_err();
            assert_eq!(err.code(), "MISSING_FIELDS");
        }
    }

    #[test]
    fn transfer_rejects_malformed_addresses() {
        let err = validate_transfer(payload(Some(1), Some("0x123"), Some(WALLET_B))).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn transfer_normalizes_addresses() {
        let lower = WALLET_A.to_lowercase();
        let (token_id, from, to) =
            validate_transfer(payload(Some(7), Some(&lower), Some(WALLET_B))).unwrap();
        assert_eq!(token_id, 7);
        assert_eq!(from, WALLET_A);
        assert_eq!(to, WALLET_B);
    }
}
