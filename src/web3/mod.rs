//! Blockchain gateway for the ticket contract.
//!
//! Handlers talk to the chain through the [`TicketChain`] trait so the HTTP
//! layer stays agnostic of the transport; [`ethereum::EthereumTicketClient`]
//! is the production implementation against a single ERC-721-like contract.

pub mod address;
pub mod ethereum;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use address::{addresses_match, normalize_address};
pub use ethereum::EthereumTicketClient;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction building failed: {0}")]
    TxBuild(String),

    #[error("transaction broadcast failed: {0}")]
    Broadcast(String),

    #[error("transaction receipt not found: {0}")]
    ReceiptNotFound(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("transaction not found: {0}")]
    TxNotFound(String),

    #[error("contract error: {0}")]
    Contract(String),

    #[error("token id {0} out of range")]
    TokenIdOutOfRange(String),
}

impl From<alloy::transports::TransportError> for ChainError {
    fn from(e: alloy::transports::TransportError) -> Self {
        ChainError::Transport(e.to_string())
    }
}

/// Outcome of a confirmed mint transaction.
#[derive(Debug, Clone)]
pub struct MintReceipt {
    pub token_id: i64,
    pub tx_hash: String,
    pub gas_used: u128,
}

/// Outcome of a confirmed transfer transaction.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub gas_used: u128,
}

/// On-chain view of a token, used by the verify endpoints. A nonexistent
/// token reverts `ownerOf`, which surfaces here as `is_valid: false`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketVerification {
    pub is_valid: bool,
    pub owner: Option<String>,
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Transaction lookup result, with the Transfer-event recipient and token id
/// decoded from the receipt logs when present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxStatus {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub token_id: Option<i64>,
    pub value: String,
    pub gas_price: Option<String>,
    pub status: String,
    pub block_number: Option<u64>,
    pub confirmations: u64,
}

#[async_trait]
pub trait TicketChain: Send + Sync {
    /// Mint a ticket token to `to`, waiting for the receipt.
    async fn mint_ticket(&self, to: &str, event_name: &str) -> Result<MintReceipt>;

    /// Current on-chain owner of a token, checksummed.
    async fn owner_of(&self, token_id: i64) -> Result<String>;

    /// `transferFrom` signed by the platform key, waiting for the receipt.
    async fn transfer_ticket(&self, from: &str, to: &str, token_id: i64) -> Result<TransferReceipt>;

    /// Owner plus stored event name for a token; never errors on a missing
    /// token, reports it as invalid instead.
    async fn verify_ticket(&self, token_id: i64) -> Result<TicketVerification>;

    /// Transaction and receipt lookup by hash.
    async fn transaction_status(&self, tx_hash: &str) -> Result<TxStatus>;
}
