//! Domain events extracted from the ledger, plus the records derived from them.

use alloy_primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

// ─── Events ───────────────────────────────────────────────────────────────────

/// An ERC-20 `Transfer(from, to, value)` log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: TxHash,
}

/// An ERC-20 `Approval(owner, spender, value)` log. A non-zero value opens a
/// vesting schedule; zero revokes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: TxHash,
}

/// A decoded `transferFrom(owner, to, amount)` call sent by `spender`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedSpend {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

// ─── Records ──────────────────────────────────────────────────────────────────

/// An entry of the bounded transfer history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub tx_hash: TxHash,
}

impl From<&TransferEvent> for TransferRecord {
    fn from(ev: &TransferEvent) -> Self {
        Self {
            from: ev.from,
            to: ev.to,
            amount: ev.amount,
            tx_hash: ev.tx_hash,
        }
    }
}

/// Key of a vesting schedule. `Address` compares bytes, so keys are
/// case-insensitive with respect to their hex spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VestingKey {
    pub owner: Address,
    pub spender: Address,
}

impl VestingKey {
    pub fn new(owner: Address, spender: Address) -> Self {
        Self { owner, spender }
    }
}

/// Static ERC-20 metadata read once from the contract at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Total supply, already rendered with `decimals`.
    pub total_supply: String,
}
