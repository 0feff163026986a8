//! User-facing ticket flows: purchase (mint), listing with reconciliation,
//! verification and transfer.

use axum::extract::{Json, Path, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db;
use crate::models::{TicketStatus, User};
use crate::reconcile;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success, success_with_message};
use crate::web3::normalize_address;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub event_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub ticket_id: Option<Uuid>,
    pub to_address: Option<String>,
}

async fn load_user(state: &AppState, id: Uuid) -> Result<User, AppError> {
    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn purchase(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PurchaseRequest>,
) -> Result<Response, AppError> {
    let event_id = payload
        .event_id
        .ok_or_else(|| AppError::MissingFields("eventId is required".to_string()))?;

    let event = db::events::find(&state.pool, event_id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    if event.available_tickets <= 0 {
        return Err(AppError::SoldOut);
    }

    let user = load_user(&state, claims.id).await?;
    let wallet = user
        .wallet_address
        .as_deref()
        .ok_or_else(|| AppError::ValidationError("Please connect wallet first".to_string()))?;

    // Pending row first so a failed mint leaves an auditable trace
    let ticket =
        db::tickets::insert_pending(&state.pool, Some(user.id), None, event.id, Some(wallet))
            .await?;

    let receipt = match state.chain.mint_ticket(wallet, &event.title).await {
        Ok(receipt) => receipt,
        Err(e) => {
            // Compensate: drop the pending row, leave the counter untouched
            db::tickets::delete(&state.pool, ticket.id).await?;
            return Err(AppError::MintFailed(e.to_string()));
        }
    };

    let ticket =
        db::tickets::mark_minted(&state.pool, ticket.id, receipt.token_id, &receipt.tx_hash)
            .await?;

    if !db::events::decrement_available(&state.pool, event.id).await? {
        // Minted but the counter raced to zero; the token exists, so only log.
        warn!(event_id = %event.id, ticket_id = %ticket.id, "Mint succeeded with no available ticket to decrement");
    }

    Ok(success_with_message(
        json!({
            "ticket": {
                "id": ticket.id,
                "eventName": event.title,
                "nftTokenId": receipt.token_id,
                "txHash": receipt.tx_hash
            }
        }),
        "Ticket purchased successfully!",
    ))
}

pub async fn my_tickets(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let user = load_user(&state, claims.id).await?;

    // Mirror on-chain ownership before answering; failures inside never
    // block the listing.
    if user.wallet_address.is_some() {
        reconcile::sync_wallet_tickets(&state, &user).await;
    }

    let tickets = db::tickets::minted_for_user(&state.pool, user.id).await?;
    Ok(success(json!({ "tickets": tickets })))
}

pub async fn verify(
    State(state): State<AppState>,
    Path(token_id): Path<i64>,
) -> Result<Response, AppError> {
    let verification = state
        .chain
        .verify_ticket(token_id)
        .await
        .map_err(|e| AppError::VerificationFailed(e.to_string()))?;

    let ticket = db::tickets::find_by_token(&state.pool, token_id).await?;
    let (event_name, status) = match &ticket {
        Some(t) => {
            let event = db::events::find(&state.pool, t.event_id).await?;
            (
                event.map(|e| e.title),
                Some(t.status),
            )
        }
        None => (None, None),
    };

    Ok(success(json!({
        "valid": verification.is_valid,
        "owner": verification.owner,
        "eventName": event_name.or(verification.event_name),
        "status": status,
        "error": verification.error
    })))
}

pub async fn transfer(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<Response, AppError> {
    let (ticket_id, to_address) = match (payload.ticket_id, payload.to_address) {
        (Some(t), Some(a)) if !a.trim().is_empty() => (t, a),
        _ => {
            return Err(AppError::MissingFields(
                "ticketId and toAddress are required".to_string(),
            ))
        }
    };

    let ticket = db::tickets::find_owned_minted(&state.pool, ticket_id, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found or not owned by you".to_string()))?;
    let token_id = ticket
        .nft_token_id
        .ok_or_else(|| AppError::InternalServerError("minted ticket without token id".to_string()))?;

    let user = load_user(&state, claims.id).await?;
    let from_wallet = user
        .wallet_address
        .as_deref()
        .ok_or_else(|| AppError::ValidationError("Your wallet is not connected".to_string()))?;

    let to_wallet = normalize_address(&to_address)
        .map_err(|_| AppError::ValidationError(format!("Invalid wallet address: {to_address}")))?;

    let receipt = state
        .chain
        .transfer_ticket(from_wallet, &to_wallet, token_id)
        .await
        .map_err(|e| AppError::TransferFailed(e.to_string()))?;

    let new_owner = db::users::find_by_wallet(&state.pool, &to_wallet).await?;
    match &new_owner {
        Some(owner) => {
            // Known account: hand over the row, keep it visible as minted
            db::tickets::reassign_owner(&state.pool, ticket.id, owner.id, TicketStatus::Minted)
                .await?;
        }
        None => {
            // External wallet: no local account to credit
            db::tickets::set_status(&state.pool, ticket.id, TicketStatus::Transferred).await?;
        }
    }
    db::tickets::set_holder_wallet(&state.pool, ticket.id, &to_wallet).await?;
    db::tickets::set_tx_hash(&state.pool, ticket.id, &receipt.tx_hash).await?;

    let message = match &new_owner {
        Some(owner) => format!("Ticket transferred to {}!", owner.name),
        None => "Ticket transferred to external wallet!".to_string(),
    };

    Ok(success_with_message(
        json!({
            "txHash": receipt.tx_hash,
            "newOwner": new_owner.map(|o| json!({ "id": o.id, "name": o.name }))
        }),
        message,
    ))
}

/// Record a transfer that already happened on chain (signed by the wallet
/// itself, not by the platform key). Same reassignment rules, no gateway call.
pub async fn sync_transfer(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<Response, AppError> {
    let (ticket_id, to_address) = match (payload.ticket_id, payload.to_address) {
        (Some(t), Some(a)) if !a.trim().is_empty() => (t, a),
        _ => {
            return Err(AppError::MissingFields(
                "ticketId and toAddress are required".to_string(),
            ))
        }
    };

    let ticket = db::tickets::find_owned(&state.pool, ticket_id, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    let to_wallet = normalize_address(&to_address)
        .map_err(|_| AppError::ValidationError(format!("Invalid wallet address: {to_address}")))?;

    match db::users::find_by_wallet(&state.pool, &to_wallet).await? {
        Some(owner) => {
            db::tickets::reassign_owner(&state.pool, ticket.id, owner.id, TicketStatus::Minted)
                .await?;
        }
        None => {
            db::tickets::set_status(&state.pool, ticket.id, TicketStatus::Transferred).await?;
        }
    }
    db::tickets::set_holder_wallet(&state.pool, ticket.id, &to_wallet).await?;

    Ok(empty_success("Database synced"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    use crate::auth::{Claims, Role};
    use crate::config::{ChainConfig, Config};
    use crate::models::Event;
    use crate::web3::{
        ChainError, MintReceipt, TicketChain, TicketVerification, TransferReceipt, TxStatus,
    };

    const WALLET: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    struct StubChain {
        mint: Result<MintReceipt, String>,
    }

    #[async_trait]
    impl TicketChain for StubChain {
        async fn mint_ticket(
            &self,
            _to: &str,
            _event_name: &str,
        ) -> crate::web3::Result<MintReceipt> {
            match &self.mint {
                Ok(receipt) => Ok(receipt.clone()),
                Err(msg) => Err(ChainError::Broadcast(msg.clone())),
            }
        }

        async fn owner_of(&self, _token_id: i64) -> crate::web3::Result<String> {
            Err(ChainError::Transport("not wired".to_string()))
        }

        async fn transfer_ticket(
            &self,
            _from: &str,
            _to: &str,
            _token_id: i64,
        ) -> crate::web3::Result<TransferReceipt> {
            Err(ChainError::Transport("not wired".to_string()))
        }

        async fn verify_ticket(&self, _token_id: i64) -> crate::web3::Result<TicketVerification> {
            Err(ChainError::Transport("not wired".to_string()))
        }

        async fn transaction_status(&self, _tx_hash: &str) -> crate::web3::Result<TxStatus> {
            Err(ChainError::Transport("not wired".to_string()))
        }
    }

    fn test_state(pool: PgPool, chain: StubChain) -> AppState {
        let config = Config {
            database_url: String::new(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            chain: ChainConfig {
                rpc_url: "http://localhost:8545".to_string(),
                contract_address: "0x0000000000000000000000000000000000000001".to_string(),
                private_key: String::new(),
                chain_id: 31_337,
            },
        };
        AppState::new(pool, Arc::new(chain), config)
    }

    async fn seed_user_and_event(state: &AppState) -> (User, Event) {
        let user = db::users::create(&state.pool, "Ada", "ada@example.com", "hash")
            .await
            .unwrap();
        db::users::set_wallet(&state.pool, user.id, WALLET)
            .await
            .unwrap();
        let user = db::users::find_by_id(&state.pool, user.id)
            .await
            .unwrap()
            .unwrap();
        let event = db::events::create(
            &state.pool,
            "Rust Conf",
            None,
            Utc::now(),
            "Hall 1",
            Decimal::ZERO,
            5,
        )
        .await
        .unwrap();
        (user, event)
    }

    fn user_claims(user: &User) -> Claims {
        Claims {
            id: user.id,
            email: user.email.clone(),
            role: Role::User,
            exp: usize::MAX,
        }
    }

    #[sqlx::test]
    async fn failed_mint_leaves_no_row_and_no_decrement(pool: PgPool) {
        let state = test_state(
            pool,
            StubChain {
                mint: Err("rpc down".to_string()),
            },
        );
        let (user, event) = seed_user_and_event(&state).await;

        let result = purchase(
            AuthUser(user_claims(&user)),
            State(state.clone()),
            Json(PurchaseRequest {
                event_id: Some(event.id),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::MintFailed(_))));

        // compensating delete removed the pending row
        let tickets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets")
            .fetch_one(&state.pool)
            .await
            .unwrap();
        assert_eq!(tickets, 0);

        let event = db::events::find(&state.pool, event.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.available_tickets, 5);
    }

    #[sqlx::test]
    async fn successful_mint_decrements_exactly_one(pool: PgPool) {
        let state = test_state(
            pool,
            StubChain {
                mint: Ok(MintReceipt {
                    token_id: 7,
                    tx_hash: "0xabc".to_string(),
                    gas_used: 21_000,
                }),
            },
        );
        let (user, event) = seed_user_and_event(&state).await;

        purchase(
            AuthUser(user_claims(&user)),
            State(state.clone()),
            Json(PurchaseRequest {
                event_id: Some(event.id),
            }),
        )
        .await
        .unwrap();

        let event = db::events::find(&state.pool, event.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.available_tickets, 4);

        let ticket = db::tickets::find_by_token(&state.pool, 7)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Minted);
        assert_eq!(ticket.user_id, Some(user.id));
        assert_eq!(ticket.tx_hash.as_deref(), Some("0xabc"));
    }
}
