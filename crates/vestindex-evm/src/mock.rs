//! In-memory [`LedgerClient`] for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;

use vestindex_core::error::IndexerError;

use crate::decoder::{AbiCallDecoder, DecodeError, DecodedCall};
use crate::events::encode_transfer_from;
use crate::fetcher::to_hex_quantity;
use crate::ledger::{EventKind, LedgerClient, RawBlock, RawLog, RawTransaction};

/// A scripted chain for one token contract.
///
/// Logs and transactions are pushed up front; the head defaults to the
/// highest block anything was pushed at.
pub struct MockLedger {
    contract: Address,
    head: AtomicU64,
    logs: Mutex<HashMap<EventKind, Vec<RawLog>>>,
    blocks: Mutex<BTreeMap<u64, Vec<RawTransaction>>>,
    fail_block: Mutex<Option<u64>>,
    fail_head: Mutex<bool>,
    log_queries: AtomicUsize,
    next_tx: AtomicU64,
    decoder: AbiCallDecoder,
}

impl MockLedger {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            head: AtomicU64::new(0),
            logs: Mutex::new(HashMap::new()),
            blocks: Mutex::new(BTreeMap::new()),
            fail_block: Mutex::new(None),
            fail_head: Mutex::new(false),
            log_queries: AtomicUsize::new(0),
            next_tx: AtomicU64::new(1),
            decoder: AbiCallDecoder::erc20().expect("built-in ERC-20 ABI parses"),
        }
    }

    pub fn set_head(&self, height: u64) {
        self.head.store(height, Ordering::SeqCst);
    }

    pub fn head(&self) -> u64 {
        self.head.load(Ordering::SeqCst)
    }

    fn bump_head(&self, block: u64) {
        self.head.fetch_max(block, Ordering::SeqCst);
    }

    fn next_tx_hash(&self) -> TxHash {
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
        TxHash::left_padding_from(&n.to_be_bytes())
    }

    fn push_log(&self, kind: EventKind, a: Address, b: Address, amount: U256, block: u64) -> TxHash {
        let tx_hash = self.next_tx_hash();
        let mut logs = self.logs.lock().unwrap();
        let entries = logs.entry(kind).or_default();
        let log_index = entries
            .iter()
            .filter(|l| l.block_number_u64().ok() == Some(block))
            .count() as u64;
        entries.push(RawLog {
            address: self.contract,
            topics: vec![kind.topic0(), a.into_word(), b.into_word()],
            data: Bytes::from(amount.to_be_bytes::<32>().to_vec()),
            block_number: to_hex_quantity(block),
            tx_hash,
            log_index: to_hex_quantity(log_index),
            removed: None,
        });
        self.bump_head(block);
        tx_hash
    }

    /// Emit a `Transfer(from, to, amount)` log at `block`.
    pub fn push_transfer(&self, from: Address, to: Address, amount: U256, block: u64) -> TxHash {
        self.push_log(EventKind::Transfer, from, to, amount, block)
    }

    /// Emit an `Approval(owner, spender, amount)` log at `block`.
    pub fn push_approval(&self, owner: Address, spender: Address, amount: U256, block: u64) -> TxHash {
        self.push_log(EventKind::Approval, owner, spender, amount, block)
    }

    /// Add a `transferFrom(from, to, amount)` transaction sent by `sender`
    /// to the contract at `block`, together with the `Transfer` log it emits.
    pub fn push_transfer_from_tx(
        &self,
        sender: Address,
        from: Address,
        to: Address,
        amount: U256,
        block: u64,
    ) -> TxHash {
        let hash = self.push_transfer(from, to, amount, block);
        self.push_tx(RawTransaction {
            hash,
            from: sender,
            to: Some(self.contract),
            input: Bytes::from(encode_transfer_from(from, to, amount)),
        }, block);
        hash
    }

    /// Add an arbitrary transaction at `block`.
    pub fn push_raw_tx(&self, from: Address, to: Option<Address>, input: Vec<u8>, block: u64) -> TxHash {
        let hash = self.next_tx_hash();
        self.push_tx(RawTransaction {
            hash,
            from,
            to,
            input: Bytes::from(input),
        }, block);
        hash
    }

    fn push_tx(&self, tx: RawTransaction, block: u64) {
        self.blocks.lock().unwrap().entry(block).or_default().push(tx);
        self.bump_head(block);
    }

    /// Make `get_block_with_transactions(height)` fail until cleared.
    pub fn fail_block_fetch(&self, height: Option<u64>) {
        *self.fail_block.lock().unwrap() = height;
    }

    /// Make `current_height` fail until cleared.
    pub fn fail_head_fetch(&self, fail: bool) {
        *self.fail_head.lock().unwrap() = fail;
    }

    /// Number of `get_logs` calls served so far.
    pub fn log_queries(&self) -> usize {
        self.log_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    fn contract(&self) -> Address {
        self.contract
    }

    async fn current_height(&self) -> Result<u64, IndexerError> {
        if *self.fail_head.lock().unwrap() {
            return Err(IndexerError::Rpc("mock: eth_blockNumber unavailable".into()));
        }
        Ok(self.head())
    }

    async fn get_logs(
        &self,
        event: EventKind,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLog>, IndexerError> {
        self.log_queries.fetch_add(1, Ordering::SeqCst);
        let logs = self.logs.lock().unwrap();
        let Some(entries) = logs.get(&event) else {
            return Ok(vec![]);
        };
        let mut out = Vec::new();
        for log in entries {
            let n = log.block_number_u64()?;
            if n >= from && n <= to {
                out.push(log.clone());
            }
        }
        out.sort_by_key(|l| {
            (
                l.block_number_u64().unwrap_or_default(),
                l.log_index_u32().unwrap_or_default(),
            )
        });
        Ok(out)
    }

    async fn get_block_with_transactions(&self, height: u64) -> Result<RawBlock, IndexerError> {
        if *self.fail_block.lock().unwrap() == Some(height) {
            return Err(IndexerError::Rpc(format!("mock: block {height} unavailable")));
        }
        if height > self.head() {
            return Err(IndexerError::BlockNotFound(height));
        }
        let transactions = self
            .blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .unwrap_or_default();
        Ok(RawBlock {
            number: to_hex_quantity(height),
            transactions,
        })
    }

    fn decode_call(&self, input: &[u8], to: Address) -> Result<DecodedCall, DecodeError> {
        if to != self.contract {
            return Err(DecodeError::WrongTarget {
                expected: self.contract,
                actual: to,
            });
        }
        self.decoder.decode_call(input)
    }
}
