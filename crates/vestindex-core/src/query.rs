//! Read-only snapshot accessors consumed by the HTTP layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::amount::{format_signed_units, format_units};
use crate::state::SharedState;
use crate::types::TokenInfo;
use crate::vesting::VestingView;

/// One entry of the recent-transfer listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferView {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub tx_hash: String,
}

/// Indexer progress and view sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerStatus {
    pub cursor_height: u64,
    pub balance_count: usize,
    pub transfer_count: usize,
    pub vesting_schedule_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// Cheap-to-clone read handle over the shared index state.
///
/// Every accessor takes the read lock for the duration of one snapshot, so
/// a reader sees the state either before or after a commit, never halfway.
#[derive(Clone)]
pub struct QueryFacade {
    state: SharedState,
    token: Option<TokenInfo>,
}

impl QueryFacade {
    pub fn new(state: SharedState) -> Self {
        Self { state, token: None }
    }

    /// Attach token metadata fetched at startup.
    pub fn with_token(mut self, token: TokenInfo) -> Self {
        self.token = Some(token);
        self
    }

    /// Address (EIP-55) → decimal balance.
    pub async fn balances(&self) -> BTreeMap<String, String> {
        let state = self.state.read().await;
        let decimals = state.token_decimals();
        state
            .balances()
            .snapshot()
            .into_iter()
            .map(|(addr, bal)| (addr.to_checksum(None), format_signed_units(bal, decimals)))
            .collect()
    }

    /// Recent transfers, newest first.
    pub async fn recent_transfers(&self) -> Vec<TransferView> {
        let state = self.state.read().await;
        let decimals = state.token_decimals();
        state
            .transfers()
            .recent()
            .into_iter()
            .map(|r| TransferView {
                from: r.from.to_checksum(None),
                to: r.to.to_checksum(None),
                amount: format_units(r.amount, decimals),
                tx_hash: format!("{:#x}", r.tx_hash),
            })
            .collect()
    }

    /// Vesting views at `at_height`, defaulting to the cursor.
    pub async fn vesting_views(&self, at_height: Option<u64>) -> Vec<VestingView> {
        let state = self.state.read().await;
        let height = at_height.unwrap_or(state.cursor().block_number);
        state.vesting().view(height, state.token_decimals())
    }

    pub async fn status(&self) -> IndexerStatus {
        let state = self.state.read().await;
        IndexerStatus {
            cursor_height: state.cursor().block_number,
            balance_count: state.balances().len(),
            transfer_count: state.transfers().len(),
            vesting_schedule_count: state.vesting().len(),
            updated_at: state.updated_at(),
        }
    }

    pub fn token(&self) -> Option<&TokenInfo> {
        self.token.as_ref()
    }
}
