//! The ledger interface the poll loop consumes, and the raw JSON-RPC shapes
//! it returns.

use alloy_primitives::{b256, Address, Bytes, TxHash, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vestindex_core::error::IndexerError;

use crate::decoder::{DecodeError, DecodedCall};
use crate::fetcher::parse_hex_u64;

/// `keccak256("Transfer(address,address,uint256)")`
pub const TRANSFER_TOPIC: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// `keccak256("Approval(address,address,uint256)")`
pub const APPROVAL_TOPIC: B256 =
    b256!("8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925");

/// The ERC-20 events the indexer scans for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Transfer,
    Approval,
}

impl EventKind {
    pub fn signature(&self) -> &'static str {
        match self {
            Self::Transfer => "Transfer(address,address,uint256)",
            Self::Approval => "Approval(address,address,uint256)",
        }
    }

    /// The event's `topic[0]`.
    pub fn topic0(&self) -> B256 {
        match self {
            Self::Transfer => TRANSFER_TOPIC,
            Self::Approval => APPROVAL_TOPIC,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transfer => write!(f, "transfer"),
            Self::Approval => write!(f, "approval"),
        }
    }
}

/// A raw EVM log as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "transactionHash")]
    pub tx_hash: TxHash,
    #[serde(rename = "logIndex")]
    pub log_index: String,
    #[serde(default)]
    pub removed: Option<bool>,
}

impl RawLog {
    pub fn block_number_u64(&self) -> Result<u64, IndexerError> {
        parse_hex_u64(&self.block_number)
    }

    pub fn log_index_u32(&self) -> Result<u32, IndexerError> {
        let idx = parse_hex_u64(&self.log_index)?;
        u32::try_from(idx).map_err(|_| IndexerError::Decode(format!("log index {idx} overflows u32")))
    }

    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }
}

/// A transaction inside a full block (`eth_getBlockByNumber(_, true)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creations.
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub input: Bytes,
}

/// A block with its full transaction objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    pub number: String,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

impl RawBlock {
    pub fn number_u64(&self) -> Result<u64, IndexerError> {
        parse_hex_u64(&self.number)
    }
}

/// Read-only access to the chain the token lives on.
///
/// All queries are scoped to the tracked token contract.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// The tracked token contract.
    fn contract(&self) -> Address;

    /// Current chain height.
    async fn current_height(&self) -> Result<u64, IndexerError>;

    /// Logs of `event` emitted by the contract in `[from, to]`, ascending by
    /// block number then log index.
    async fn get_logs(&self, event: EventKind, from: u64, to: u64)
        -> Result<Vec<RawLog>, IndexerError>;

    /// The block at `height` with full transaction objects.
    async fn get_block_with_transactions(&self, height: u64) -> Result<RawBlock, IndexerError>;

    /// Decode `input` as a call to the contract's ABI. Fails for calls to
    /// other addresses and for selectors the ABI does not know.
    fn decode_call(&self, input: &[u8], to: Address) -> Result<DecodedCall, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    #[test]
    fn topics_match_signatures() {
        for kind in [EventKind::Transfer, EventKind::Approval] {
            assert_eq!(kind.topic0(), keccak256(kind.signature().as_bytes()), "{kind}");
        }
    }

    #[test]
    fn raw_log_from_rpc_json() {
        let json = serde_json::json!({
            "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "topics": [format!("{TRANSFER_TOPIC:#x}")],
            "data": "0x",
            "blockNumber": "0x1b4",
            "blockHash": "0x00",
            "transactionHash": format!("0x{}", "ab".repeat(32)),
            "logIndex": "0x5",
        });
        let log: RawLog = serde_json::from_value(json).unwrap();
        assert_eq!(log.block_number_u64().unwrap(), 436);
        assert_eq!(log.log_index_u32().unwrap(), 5);
        assert!(!log.is_removed());
        assert_eq!(log.topics[0], TRANSFER_TOPIC);
    }

    #[test]
    fn raw_block_with_contract_creation() {
        let json = serde_json::json!({
            "number": "0x10",
            "hash": "0x00",
            "transactions": [{
                "hash": format!("0x{}", "01".repeat(32)),
                "from": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "to": null,
                "input": "0x6080",
            }],
        });
        let block: RawBlock = serde_json::from_value(json).unwrap();
        assert_eq!(block.number_u64().unwrap(), 16);
        assert!(block.transactions[0].to.is_none());
        assert_eq!(block.transactions[0].input.len(), 2);
    }
}
