//! Alloy-backed client for the ticket contract.
//!
//! All transactions are signed by the single platform-held key; the contract
//! sees the platform as sender regardless of which user or developer asked.

use alloy::consensus::Transaction as _;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Log, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::ChainConfig;

use super::{
    ChainError, MintReceipt, Result, TicketChain, TicketVerification, TransferReceipt, TxStatus,
};

sol! {
    function mintTicket(address to, string eventName) returns (uint256);
    function ownerOf(uint256 tokenId) view returns (address);
    function transferFrom(address from, address to, uint256 tokenId);
    function ticketEventName(uint256 tokenId) view returns (string);
    function totalSupply() view returns (uint256);

    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
}

pub struct EthereumTicketClient {
    provider: RootProvider<Http<Client>>,
    wallet: EthereumWallet,
    signer_address: Address,
    contract: Address,
    chain_id: u64,
}

impl EthereumTicketClient {
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let provider = ProviderBuilder::new().on_http(
            config
                .rpc_url
                .parse()
                .map_err(|e: url::ParseError| ChainError::RpcConnection(e.to_string()))?,
        );

        let key_hex = config
            .private_key
            .strip_prefix("0x")
            .unwrap_or(&config.private_key);
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e: alloy::signers::local::LocalSignerError| {
                ChainError::InvalidPrivateKey(e.to_string())
            })?;
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let contract: Address = config
            .contract_address
            .parse()
            .map_err(|_| ChainError::InvalidAddress(config.contract_address.clone()))?;

        Ok(Self {
            provider,
            wallet,
            signer_address,
            contract,
            chain_id: config.chain_id,
        })
    }

    /// Create the client and verify the RPC endpoint serves the configured chain.
    pub async fn connect(config: &ChainConfig) -> Result<Self> {
        let client = Self::new(config)?;
        let chain_id = client.provider.get_chain_id().await?;
        if chain_id != client.chain_id {
            return Err(ChainError::RpcConnection(format!(
                "chain id mismatch: expected {}, rpc reports {}",
                client.chain_id, chain_id
            )));
        }
        info!(chain_id, contract = %client.contract, "Connected to ticket contract");
        Ok(client)
    }

    fn parse_address(input: &str) -> Result<Address> {
        input
            .trim()
            .parse()
            .map_err(|_| ChainError::InvalidAddress(input.to_string()))
    }

    fn token_uint(token_id: i64) -> Result<U256> {
        if token_id < 0 {
            return Err(ChainError::TokenIdOutOfRange(token_id.to_string()));
        }
        Ok(U256::from(token_id as u64))
    }

    /// Read-only contract call.
    async fn call(&self, calldata: Vec<u8>) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .with_to(self.contract)
            .with_input(Bytes::from(calldata));
        Ok(self.provider.call(&tx).await?)
    }

    /// Sign and broadcast a contract transaction, then wait for its receipt.
    async fn send(&self, calldata: Vec<u8>) -> Result<alloy::rpc::types::TransactionReceipt> {
        let tx = TransactionRequest::default()
            .with_from(self.signer_address)
            .with_to(self.contract)
            .with_value(U256::ZERO)
            .with_input(Bytes::from(calldata));

        let gas_limit = self.provider.estimate_gas(&tx).await?;
        let gas_price = self.provider.get_gas_price().await?;
        let nonce = self
            .provider
            .get_transaction_count(self.signer_address)
            .await?;

        let tx = tx
            .with_gas_limit(gas_limit)
            .with_gas_price(gas_price)
            .with_chain_id(self.chain_id)
            .with_nonce(nonce);

        let envelope = tx
            .build(&self.wallet)
            .await
            .map_err(|e| ChainError::TxBuild(e.to_string()))?;

        let pending = self
            .provider
            .send_tx_envelope(envelope)
            .await
            .map_err(|e| ChainError::Broadcast(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        debug!(tx_hash = %tx_hash, "Transaction sent, waiting for receipt");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::ReceiptNotFound(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!("{:#x}", tx_hash)));
        }

        Ok(receipt)
    }

    async fn total_supply(&self) -> Result<U256> {
        let out = self.call(totalSupplyCall {}.abi_encode()).await?;
        let decoded = totalSupplyCall::abi_decode_returns(&out, true)
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(decoded._0)
    }

    async fn event_name(&self, token_id: U256) -> Result<String> {
        let out = self
            .call(ticketEventNameCall { tokenId: token_id }.abi_encode())
            .await?;
        let decoded = ticketEventNameCall::abi_decode_returns(&out, true)
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(decoded._0)
    }
}

/// Pull recipient and token id out of the receipt's Transfer event. All three
/// params are indexed, so they live in the topics.
fn decode_transfer(logs: &[Log]) -> Option<(Address, i64)> {
    for log in logs {
        let topics = log.inner.data.topics();
        if topics.len() == 4 && topics[0] == Transfer::SIGNATURE_HASH {
            let to = Address::from_word(topics[2]);
            let raw = U256::from_be_bytes(topics[3].0);
            let token_id = u64::try_from(raw).ok().and_then(|v| i64::try_from(v).ok())?;
            return Some((to, token_id));
        }
    }
    None
}

fn u256_to_i64(value: U256) -> Result<i64> {
    u64::try_from(value)
        .ok()
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(|| ChainError::TokenIdOutOfRange(value.to_string()))
}

fn looks_like_missing_token(message: &str) -> bool {
    message.contains("ERC721NonexistentToken")
        || message.contains("invalid token")
        || message.contains("execution reverted")
}

#[async_trait]
impl TicketChain for EthereumTicketClient {
    async fn mint_ticket(&self, to: &str, event_name: &str) -> Result<MintReceipt> {
        let to_addr = Self::parse_address(to)?;

        info!(to = %to_addr, event_name, "Minting ticket");
        let calldata = mintTicketCall {
            to: to_addr,
            eventName: event_name.to_string(),
        }
        .abi_encode();
        let receipt = self.send(calldata).await?;

        // Token id comes from the Transfer event; fall back to totalSupply - 1
        // when the node strips logs.
        let token_id = match decode_transfer(receipt.inner.logs()) {
            Some((_, token_id)) => token_id,
            None => {
                let supply = self.total_supply().await?;
                u256_to_i64(supply.saturating_sub(U256::from(1u64)))?
            }
        };

        let tx_hash = format!("{:#x}", receipt.transaction_hash);
        info!(token_id, tx_hash = %tx_hash, "Mint confirmed");

        Ok(MintReceipt {
            token_id,
            tx_hash,
            gas_used: receipt.gas_used as u128,
        })
    }

    async fn owner_of(&self, token_id: i64) -> Result<String> {
        let token = Self::token_uint(token_id)?;
        let out = self.call(ownerOfCall { tokenId: token }.abi_encode()).await?;
        let decoded = ownerOfCall::abi_decode_returns(&out, true)
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(decoded._0.to_checksum(None))
    }

    async fn transfer_ticket(&self, from: &str, to: &str, token_id: i64) -> Result<TransferReceipt> {
        let from_addr = Self::parse_address(from)?;
        let to_addr = Self::parse_address(to)?;
        let token = Self::token_uint(token_id)?;

        info!(token_id, from = %from_addr, to = %to_addr, "Transferring ticket");
        let calldata = transferFromCall {
            from: from_addr,
            to: to_addr,
            tokenId: token,
        }
        .abi_encode();
        let receipt = self.send(calldata).await?;

        let tx_hash = format!("{:#x}", receipt.transaction_hash);
        info!(token_id, tx_hash = %tx_hash, "Transfer confirmed");

        Ok(TransferReceipt {
            tx_hash,
            gas_used: receipt.gas_used as u128,
        })
    }

    async fn verify_ticket(&self, token_id: i64) -> Result<TicketVerification> {
        let token = Self::token_uint(token_id)?;

        match self.owner_of(token_id).await {
            Ok(owner) => {
                let event_name = self.event_name(token).await.ok();
                Ok(TicketVerification {
                    is_valid: true,
                    owner: Some(owner),
                    event_name,
                    error: None,
                })
            }
            Err(e) => {
                let message = e.to_string();
                let error = if looks_like_missing_token(&message) {
                    "Token does not exist on blockchain".to_string()
                } else {
                    message
                };
                Ok(TicketVerification {
                    is_valid: false,
                    owner: None,
                    event_name: None,
                    error: Some(error),
                })
            }
        }
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TxStatus> {
        let hash: TxHash = tx_hash
            .trim()
            .parse()
            .map_err(|_| ChainError::InvalidTxHash(tx_hash.to_string()))?;

        let tx = self
            .provider
            .get_transaction_by_hash(hash)
            .await?
            .ok_or_else(|| ChainError::TxNotFound(tx_hash.to_string()))?;

        let receipt = self.provider.get_transaction_receipt(hash).await?;

        let (recipient, token_id) = receipt
            .as_ref()
            .and_then(|r| decode_transfer(r.inner.logs()))
            .map(|(to, token)| (Some(to.to_checksum(None)), Some(token)))
            .unwrap_or((None, None));

        let (status, block_number, confirmations) = match &receipt {
            Some(r) => {
                let status = if r.status() { "confirmed" } else { "failed" };
                let block = r.block_number;
                let confirmations = match block {
                    Some(b) => {
                        let head = self.provider.get_block_number().await?;
                        head.saturating_sub(b) + 1
                    }
                    None => 0,
                };
                (status, block, confirmations)
            }
            None => ("pending", None, 0),
        };

        Ok(TxStatus {
            hash: format!("{:#x}", hash),
            from: tx.from.to_checksum(None),
            to: recipient.or_else(|| tx.to().map(|a| a.to_checksum(None))),
            token_id,
            value: tx.value().to_string(),
            gas_price: tx.gas_price().map(|p| p.to_string()),
            status: status.to_string(),
            block_number,
            confirmations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    fn transfer_log(to: Address, token_id: u64) -> Log {
        let topics = vec![
            Transfer::SIGNATURE_HASH,
            B256::ZERO,
            to.into_word(),
            B256::from(U256::from(token_id)),
        ];
        let inner = alloy::primitives::Log::new_unchecked(
            Address::ZERO,
            topics,
            Bytes::new(),
        );
        Log {
            inner,
            ..Default::default()
        }
    }

    #[test]
    fn decodes_transfer_recipient_and_token() {
        let to: Address = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
            .parse()
            .unwrap();
        let logs = vec![transfer_log(to, 42)];
        let (decoded_to, token_id) = decode_transfer(&logs).unwrap();
        assert_eq!(decoded_to, to);
        assert_eq!(token_id, 42);
    }

    #[test]
    fn ignores_unrelated_logs() {
        let inner = alloy::primitives::Log::new_unchecked(
            Address::ZERO,
            vec![B256::ZERO],
            Bytes::new(),
        );
        let logs = vec![Log {
            inner,
            ..Default::default()
        }];
        assert!(decode_transfer(&logs).is_none());
    }

    #[test]
    fn rejects_negative_token_ids() {
        assert!(EthereumTicketClient::token_uint(-1).is_err());
        assert!(EthereumTicketClient::token_uint(7).is_ok());
    }

    #[test]
    fn missing_token_detection() {
        assert!(looks_like_missing_token("execution reverted: ERC721NonexistentToken(99)"));
        assert!(!looks_like_missing_token("connection refused"));
    }
}
