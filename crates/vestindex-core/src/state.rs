//! The indexer's owned state and the batch it is advanced by.
//!
//! A pass fetches everything it needs first and collects it into a
//! [`PassBatch`]. Applying a batch cannot fail, so a pass that errors while
//! fetching leaves every projection and the cursor exactly as they were, and
//! the retried range is applied exactly once.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::balances::BalanceProjection;
use crate::cursor::Cursor;
use crate::indexer::IndexerConfig;
use crate::transfers::TransferLog;
use crate::types::{ApprovalEvent, DelegatedSpend, TransferEvent, TransferRecord};
use crate::vesting::{GrantOutcome, VestingEngine};

/// State shared between the poll loop (writer) and the query facade (readers).
pub type SharedState = Arc<RwLock<IndexState>>;

/// Everything one pass observed in `[from_block, to_block]`, in log order.
#[derive(Debug, Clone, Default)]
pub struct PassBatch {
    pub from_block: u64,
    pub to_block: u64,
    pub transfers: Vec<TransferEvent>,
    pub approvals: Vec<ApprovalEvent>,
    pub spends: Vec<DelegatedSpend>,
}

impl PassBatch {
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            ..Default::default()
        }
    }

    pub fn event_count(&self) -> usize {
        self.transfers.len() + self.approvals.len() + self.spends.len()
    }
}

/// What applying a batch changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub transfers: usize,
    pub grants: usize,
    pub revokes: usize,
    pub spends_tracked: usize,
    pub spends_ignored: usize,
}

/// All projections plus the cursor. Owned by the process; nothing is static.
#[derive(Debug, Clone)]
pub struct IndexState {
    cursor: Cursor,
    balances: BalanceProjection,
    transfers: TransferLog,
    vesting: VestingEngine,
    token_decimals: u8,
    /// Unix timestamp of the last committed pass.
    updated_at: Option<i64>,
}

impl IndexState {
    pub fn new(config: &IndexerConfig, cursor: Cursor) -> Self {
        Self {
            cursor,
            balances: BalanceProjection::new(),
            transfers: TransferLog::new(config.transfer_log_capacity),
            vesting: VestingEngine::new(config.vesting.clone()),
            token_decimals: config.token_decimals,
            updated_at: None,
        }
    }

    /// Wrap into the shared handle used by the poll loop and facade.
    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Apply a batch and advance the cursor to `batch.to_block`.
    ///
    /// Returns `None` without touching anything if the batch does not extend
    /// past the cursor (a stale or duplicate pass).
    pub fn apply(&mut self, batch: &PassBatch) -> Option<ApplySummary> {
        if batch.to_block <= self.cursor.block_number {
            return None;
        }

        let mut summary = ApplySummary::default();

        for ev in &batch.transfers {
            self.balances.apply_transfer(ev.from, ev.to, ev.amount);
            self.transfers.append(TransferRecord::from(ev));
            summary.transfers += 1;
        }

        for ev in &batch.approvals {
            match self
                .vesting
                .on_approval_grant(ev.owner, ev.spender, ev.amount, ev.block_number)
            {
                GrantOutcome::Created | GrantOutcome::Replaced => summary.grants += 1,
                GrantOutcome::Revoked | GrantOutcome::NoSchedule => summary.revokes += 1,
            }
        }

        for sp in &batch.spends {
            if self
                .vesting
                .on_delegated_spend(sp.owner, sp.spender, sp.amount, sp.block_number)
            {
                summary.spends_tracked += 1;
            } else {
                summary.spends_ignored += 1;
            }
        }

        self.cursor.advance(batch.to_block);
        self.updated_at = Some(chrono::Utc::now().timestamp());
        Some(summary)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn balances(&self) -> &BalanceProjection {
        &self.balances
    }

    pub fn transfers(&self) -> &TransferLog {
        &self.transfers
    }

    pub fn vesting(&self) -> &VestingEngine {
        &self.vesting
    }

    pub fn token_decimals(&self) -> u8 {
        self.token_decimals
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::parse_whole_units;
    use crate::types::VestingKey;
    use alloy_primitives::{Address, TxHash, U256};

    const A: Address = Address::repeat_byte(0xa);
    const B: Address = Address::repeat_byte(0xb);
    const C: Address = Address::repeat_byte(0xc);

    fn tokens(n: u64) -> U256 {
        parse_whole_units(n, 18)
    }

    fn transfer(from: Address, to: Address, n: u64, block: u64, idx: u32) -> TransferEvent {
        TransferEvent {
            from,
            to,
            amount: tokens(n),
            block_number: block,
            log_index: idx,
            tx_hash: TxHash::repeat_byte(idx as u8),
        }
    }

    fn approval(owner: Address, spender: Address, n: u64, block: u64, idx: u32) -> ApprovalEvent {
        ApprovalEvent {
            owner,
            spender,
            amount: tokens(n),
            block_number: block,
            log_index: idx,
            tx_hash: TxHash::repeat_byte(idx as u8),
        }
    }

    fn spend(owner: Address, spender: Address, n: u64, block: u64) -> DelegatedSpend {
        DelegatedSpend {
            owner,
            spender,
            amount: tokens(n),
            block_number: block,
            tx_hash: TxHash::ZERO,
        }
    }

    fn state_at(cursor: u64) -> IndexState {
        IndexState::new(&IndexerConfig::default(), Cursor::new(cursor))
    }

    #[test]
    fn apply_advances_cursor_and_projections() {
        let mut state = state_at(99);
        let mut batch = PassBatch::new(100, 105);
        batch.transfers.push(transfer(A, B, 50, 100, 0));
        batch.transfers.push(transfer(B, C, 20, 101, 1));

        let summary = state.apply(&batch).unwrap();
        assert_eq!(summary.transfers, 2);
        assert_eq!(state.cursor().block_number, 105);
        assert_eq!(state.balances().get(&B), Some(crate::amount::to_signed(tokens(30))));
        assert_eq!(state.transfers().len(), 2);
        assert!(state.updated_at().is_some());
    }

    #[test]
    fn stale_batch_is_ignored() {
        let mut state = state_at(200);
        let mut batch = PassBatch::new(150, 200);
        batch.transfers.push(transfer(A, B, 1, 150, 0));
        assert!(state.apply(&batch).is_none());
        assert!(state.balances().is_empty());
        assert_eq!(state.cursor().block_number, 200);
    }

    #[test]
    fn two_grants_in_one_batch_last_wins() {
        let mut state = state_at(0);
        let mut batch = PassBatch::new(1, 10);
        batch.approvals.push(approval(A, B, 40, 3, 0));
        batch.approvals.push(approval(A, B, 60, 4, 1));
        state.apply(&batch).unwrap();

        let key = VestingKey::new(A, B);
        let s = state.vesting().schedule(&key).unwrap();
        assert_eq!(s.total_granted, tokens(60));
        assert_eq!(s.grant_start_height, 4);
        assert_eq!(state.vesting().spent(&key), Some(U256::ZERO));
    }

    #[test]
    fn grant_then_revoke_in_batch_ends_absent() {
        let mut state = state_at(0);
        let mut batch = PassBatch::new(1, 10);
        batch.approvals.push(approval(A, B, 40, 3, 0));
        batch.approvals.push(approval(A, B, 0, 5, 1));
        batch.spends.push(spend(A, B, 5, 6));
        let summary = state.apply(&batch).unwrap();

        assert!(state.vesting().is_empty());
        assert_eq!(summary.grants, 1);
        assert_eq!(summary.revokes, 1);
        assert_eq!(summary.spends_ignored, 1);
    }

    #[test]
    fn spends_are_applied_after_approvals() {
        let mut state = state_at(0);
        let mut batch = PassBatch::new(1, 10);
        // spend observed in an earlier block than the grant still counts,
        // because the spend scan runs after the approval scan
        batch.approvals.push(approval(A, B, 100, 8, 0));
        batch.spends.push(spend(A, B, 10, 2));
        state.apply(&batch).unwrap();
        assert_eq!(state.vesting().spent(&VestingKey::new(A, B)), Some(tokens(10)));
    }

    #[test]
    fn mint_only_batch_conserves_supply() {
        let mut state = state_at(0);
        let mut batch = PassBatch::new(1, 1);
        batch.transfers.push(transfer(Address::ZERO, A, 1000, 1, 0));
        batch.transfers.push(transfer(A, B, 400, 1, 1));
        state.apply(&batch).unwrap();
        assert_eq!(
            state.balances().total_supply_view(),
            crate::amount::to_signed(tokens(1000))
        );
    }
}
