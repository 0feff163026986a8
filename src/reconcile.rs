//! Ownership reconciliation between the ticket table and the contract.
//!
//! The contract is independently mutable (wallets can move tokens without
//! touching this backend), so the local `user_id` column is only a mirror.
//! Whenever a wallet-connected user lists their tickets we walk every minted
//! ticket, ask the chain who owns the token now, and rewrite the local owner
//! where the two disagree. Per-ticket failures are logged and skipped; the
//! pass holds no locks and promises nothing stronger than eventual
//! convergence across repeated listings.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db;
use crate::models::{TicketStatus, User};
use crate::state::AppState;
use crate::web3::addresses_match;

/// What a single ticket's chain ownership implies for the local row, seen
/// from the perspective of the user driving the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drift {
    /// Chain says the caller owns it, the row credits someone else.
    ClaimForCaller,
    /// The row credits the caller, chain says another wallet holds it.
    ReleaseFromCaller,
    /// Row and chain agree as far as this caller can tell.
    InSync,
}

pub fn classify(
    chain_owner: &str,
    caller_wallet: &str,
    row_owner: Option<Uuid>,
    caller_id: Uuid,
) -> Drift {
    let chain_is_caller = addresses_match(chain_owner, caller_wallet);
    let row_is_caller = row_owner == Some(caller_id);

    match (chain_is_caller, row_is_caller) {
        (true, false) => Drift::ClaimForCaller,
        (false, true) => Drift::ReleaseFromCaller,
        _ => Drift::InSync,
    }
}

/// Best-effort pass over all minted tickets. Never returns an error; the
/// caller's listing must succeed even when the chain is unreachable.
pub async fn sync_wallet_tickets(state: &AppState, user: &User) {
    let Some(wallet) = user.wallet_address.as_deref() else {
        debug!(user_id = %user.id, "No wallet connected, skipping sync");
        return;
    };

    let tickets = match db::tickets::minted_with_token(&state.pool).await {
        Ok(tickets) => tickets,
        Err(e) => {
            warn!(error = %e, "Could not load minted tickets for sync");
            return;
        }
    };

    for ticket in tickets {
        let Some(token_id) = ticket.nft_token_id else {
            continue;
        };

        let chain_owner = match state.chain.owner_of(token_id).await {
            Ok(owner) => owner,
            Err(e) => {
                debug!(ticket_id = %ticket.id, token_id, error = %e, "Owner lookup failed, skipping ticket");
                continue;
            }
        };

        match classify(&chain_owner, wallet, ticket.user_id, user.id) {
            Drift::ClaimForCaller => {
                match db::tickets::reassign_owner(&state.pool, ticket.id, user.id, TicketStatus::Minted)
                    .await
                {
                    Ok(()) => info!(ticket_id = %ticket.id, user_id = %user.id, "Synced ticket to caller"),
                    Err(e) => warn!(ticket_id = %ticket.id, error = %e, "Failed to reassign ticket"),
                }
            }
            Drift::ReleaseFromCaller => {
                // The token left the caller's wallet; hand the row to whichever
                // local account holds the on-chain wallet, if any.
                match db::users::find_by_wallet(&state.pool, &chain_owner).await {
                    Ok(Some(actual_owner)) => {
                        match db::tickets::reassign_owner(
                            &state.pool,
                            ticket.id,
                            actual_owner.id,
                            TicketStatus::Minted,
                        )
                        .await
                        {
                            Ok(()) => info!(
                                ticket_id = %ticket.id,
                                user_id = %actual_owner.id,
                                "Synced ticket to actual owner"
                            ),
                            Err(e) => warn!(ticket_id = %ticket.id, error = %e, "Failed to reassign ticket"),
                        }
                    }
                    Ok(None) => {
                        debug!(ticket_id = %ticket.id, owner = %chain_owner, "On-chain owner has no local account")
                    }
                    Err(e) => warn!(ticket_id = %ticket.id, error = %e, "Owner lookup query failed"),
                }
            }
            Drift::InSync => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET_A: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
    const WALLET_B: &str = "0x0000000000000000000000000000000000000bEEF";

    #[test]
    fn chain_owner_is_caller_but_row_is_not() {
        let caller = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(
            classify(WALLET_A, WALLET_A, Some(other), caller),
            Drift::ClaimForCaller
        );
    }

    #[test]
    fn chain_owner_is_caller_ignores_casing() {
        let caller = Uuid::new_v4();
        assert_eq!(
            classify(&WALLET_A.to_lowercase(), WALLET_A, None, caller),
            Drift::ClaimForCaller
        );
    }

    #[test]
    fn row_credits_caller_but_chain_moved_on() {
        let caller = Uuid::new_v4();
        assert_eq!(
            classify(WALLET_B, WALLET_A, Some(caller), caller),
            Drift::ReleaseFromCaller
        );
    }

    #[test]
    fn agreement_both_ways_is_in_sync() {
        let caller = Uuid::new_v4();
        assert_eq!(
            classify(WALLET_A, WALLET_A, Some(caller), caller),
            Drift::InSync
        );
        assert_eq!(classify(WALLET_B, WALLET_A, None, caller), Drift::InSync);
    }
}
