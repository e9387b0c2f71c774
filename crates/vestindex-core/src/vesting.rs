//! Vesting engine: per-(owner, spender) release schedules opened by
//! allowance grants and drawn down by delegated spends.
//!
//! # Lifecycle of a key
//!
//! ```text
//! absent ──grant(>0)──► active ──height passes──► fully released
//!    ▲                    │  ▲                          │
//!    │                    │  └──────grant(>0)───────────┤   (overwrite, spend reset)
//!    └─────grant(0)───────┴─────────────────────────────┘   (revoke)
//! ```
//!
//! Released amounts depend only on block height: the first step unlocks at
//! the grant height itself, and one more step unlocks every
//! `unlock_interval_heights` blocks until the grant is exhausted.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::amount::{format_units, parse_whole_units};
use crate::error::IndexerError;
use crate::types::VestingKey;

/// Default unlock interval in blocks.
pub const DEFAULT_UNLOCK_INTERVAL_HEIGHTS: u64 = 10;

/// Default unlock step in whole tokens.
pub const DEFAULT_UNLOCK_STEP_TOKENS: u64 = 25;

// ─── Policy ───────────────────────────────────────────────────────────────────

/// Release policy applied to every schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingPolicy {
    /// Amount (base units) unlocked per step.
    pub unlock_step_amount: U256,
    /// Blocks between two unlock steps. Must be non-zero.
    pub unlock_interval_heights: u64,
}

impl VestingPolicy {
    pub fn new(unlock_step_amount: U256, unlock_interval_heights: u64) -> Self {
        Self {
            unlock_step_amount,
            unlock_interval_heights,
        }
    }

    /// The default policy for a token with `decimals` decimals:
    /// 25 tokens every 10 blocks.
    pub fn with_decimals(decimals: u8) -> Self {
        Self::new(
            parse_whole_units(DEFAULT_UNLOCK_STEP_TOKENS, decimals),
            DEFAULT_UNLOCK_INTERVAL_HEIGHTS,
        )
    }

    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.unlock_interval_heights == 0 {
            return Err(IndexerError::Config(
                "vesting.unlock_interval_heights must be greater than zero".into(),
            ));
        }
        if self.unlock_step_amount.is_zero() {
            return Err(IndexerError::Config(
                "vesting.unlock_step_amount must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for VestingPolicy {
    fn default() -> Self {
        Self::with_decimals(18)
    }
}

// ─── Schedule ─────────────────────────────────────────────────────────────────

/// A single vesting schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub owner: Address,
    pub spender: Address,
    pub total_granted: U256,
    pub unlock_step_amount: U256,
    pub grant_start_height: u64,
    pub unlock_interval_heights: u64,
}

impl VestingSchedule {
    /// Number of steps unlocked at `at_height`. Always at least 1.
    fn steps_unlocked(&self, at_height: u64) -> u64 {
        let elapsed = at_height.saturating_sub(self.grant_start_height);
        // `max(1)` keeps a hand-built zero-interval schedule from dividing by zero.
        elapsed / self.unlock_interval_heights.max(1) + 1
    }

    /// Cumulative amount unlocked at `at_height`, capped at `total_granted`.
    pub fn compute_released(&self, at_height: u64) -> U256 {
        let steps = U256::from(self.steps_unlocked(at_height));
        self.unlock_step_amount
            .saturating_mul(steps)
            .min(self.total_granted)
    }

    /// Height at which the next step unlocks, or `None` once fully vested.
    pub fn compute_next_unlock_height(&self, at_height: u64) -> Option<u64> {
        if self.compute_released(at_height) == self.total_granted {
            return None;
        }
        let steps = self.steps_unlocked(at_height);
        Some(
            self.grant_start_height
                .saturating_add(steps.saturating_mul(self.unlock_interval_heights)),
        )
    }

    pub fn is_fully_released(&self, at_height: u64) -> bool {
        self.compute_released(at_height) == self.total_granted
    }

    pub fn key(&self) -> VestingKey {
        VestingKey::new(self.owner, self.spender)
    }
}

// ─── View ─────────────────────────────────────────────────────────────────────

/// Rendered state of one schedule at a given height.
///
/// Serialized field names follow the web client's contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingView {
    pub owner: String,
    pub spender: String,
    pub total: String,
    pub released: String,
    pub spent: String,
    pub available: String,
    #[serde(rename = "startBlock")]
    pub grant_start_height: u64,
    #[serde(rename = "intervalBlocks")]
    pub unlock_interval_heights: u64,
    #[serde(rename = "step")]
    pub unlock_step_amount: String,
    #[serde(rename = "nextReleaseBlock")]
    pub next_unlock_height: Option<u64>,
}

// ─── Engine ───────────────────────────────────────────────────────────────────

/// What a grant event did to its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// A schedule was opened for a previously absent key.
    Created,
    /// An existing schedule was overwritten and its spend reset.
    Replaced,
    /// A zero grant removed an existing schedule.
    Revoked,
    /// A zero grant for a key with no schedule.
    NoSchedule,
}

/// Schedule and delegated-spend tables, keyed by (owner, spender).
///
/// Every key in `spends` is also in `schedules`; both are inserted, reset and
/// removed together.
#[derive(Debug, Clone)]
pub struct VestingEngine {
    policy: VestingPolicy,
    schedules: HashMap<VestingKey, VestingSchedule>,
    spends: HashMap<VestingKey, U256>,
}

impl VestingEngine {
    pub fn new(policy: VestingPolicy) -> Self {
        Self {
            policy,
            schedules: HashMap::new(),
            spends: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &VestingPolicy {
        &self.policy
    }

    /// Apply an allowance grant observed at `at_height`.
    ///
    /// The latest grant always wins: a non-zero amount replaces any existing
    /// schedule outright, and zero revokes it.
    pub fn on_approval_grant(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
        at_height: u64,
    ) -> GrantOutcome {
        let key = VestingKey::new(owner, spender);

        if amount.is_zero() {
            self.spends.remove(&key);
            return match self.schedules.remove(&key) {
                Some(_) => GrantOutcome::Revoked,
                None => GrantOutcome::NoSchedule,
            };
        }

        let schedule = VestingSchedule {
            owner,
            spender,
            total_granted: amount,
            unlock_step_amount: self.policy.unlock_step_amount,
            grant_start_height: at_height,
            unlock_interval_heights: self.policy.unlock_interval_heights,
        };
        self.spends.insert(key, U256::ZERO);
        match self.schedules.insert(key, schedule) {
            Some(_) => GrantOutcome::Replaced,
            None => GrantOutcome::Created,
        }
    }

    /// Record a delegated spend. Returns `false` if the pair has no schedule,
    /// in which case nothing is tracked.
    pub fn on_delegated_spend(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
        _at_height: u64,
    ) -> bool {
        let key = VestingKey::new(owner, spender);
        if !self.schedules.contains_key(&key) {
            tracing::debug!(%owner, %spender, %amount, "delegated spend without a schedule ignored");
            return false;
        }
        let spent = self.spends.entry(key).or_insert(U256::ZERO);
        *spent = spent.saturating_add(amount);
        true
    }

    pub fn schedule(&self, key: &VestingKey) -> Option<&VestingSchedule> {
        self.schedules.get(key)
    }

    /// Cumulative delegated spend for `key`, if it has a schedule.
    pub fn spent(&self, key: &VestingKey) -> Option<U256> {
        self.spends.get(key).copied()
    }

    /// Render every active schedule at `at_height`, sorted by key.
    pub fn view(&self, at_height: u64, decimals: u8) -> Vec<VestingView> {
        let mut keys: Vec<&VestingKey> = self.schedules.keys().collect();
        keys.sort();

        keys.into_iter()
            .filter_map(|key| {
                let s = self.schedules.get(key)?;
                let spent = self.spends.get(key).copied().unwrap_or(U256::ZERO);
                let released = s.compute_released(at_height);
                Some(VestingView {
                    owner: s.owner.to_checksum(None),
                    spender: s.spender.to_checksum(None),
                    total: format_units(s.total_granted, decimals),
                    released: format_units(released, decimals),
                    spent: format_units(spent, decimals),
                    available: format_units(released.saturating_sub(spent), decimals),
                    grant_start_height: s.grant_start_height,
                    unlock_interval_heights: s.unlock_interval_heights,
                    unlock_step_amount: format_units(s.unlock_step_amount, decimals),
                    next_unlock_height: s.compute_next_unlock_height(at_height),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

impl Default for VestingEngine {
    fn default() -> Self {
        Self::new(VestingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::repeat_byte(0x0a);
    const SPENDER: Address = Address::repeat_byte(0x0b);

    fn tokens(n: u64) -> U256 {
        parse_whole_units(n, 18)
    }

    fn schedule(total: u64, start: u64) -> VestingSchedule {
        VestingSchedule {
            owner: OWNER,
            spender: SPENDER,
            total_granted: tokens(total),
            unlock_step_amount: tokens(25),
            grant_start_height: start,
            unlock_interval_heights: 10,
        }
    }

    #[test]
    fn first_step_unlocks_at_grant_height() {
        let s = schedule(100, 100);
        assert_eq!(s.compute_released(100), tokens(25));
        assert_eq!(s.compute_next_unlock_height(100), Some(110));
    }

    #[test]
    fn grant_scenario_100_units() {
        let s = schedule(100, 100);
        assert_eq!(s.compute_released(115), tokens(50));
        assert_eq!(s.compute_next_unlock_height(115), Some(120));
        assert_eq!(s.compute_released(200), tokens(100));
        assert_eq!(s.compute_next_unlock_height(200), None);
    }

    #[test]
    fn released_at_step_boundaries() {
        let s = schedule(90, 40);
        for k in 0..20u64 {
            let expected = tokens(25).saturating_mul(U256::from(k + 1)).min(tokens(90));
            assert_eq!(s.compute_released(40 + k * 10), expected, "k={k}");
        }
    }

    #[test]
    fn released_is_monotonic_and_bounded() {
        let s = schedule(70, 5);
        let mut prev = U256::ZERO;
        for h in 0..200 {
            let r = s.compute_released(h);
            assert!(r >= prev, "released decreased at height {h}");
            assert!(r <= s.total_granted);
            prev = r;
        }
    }

    #[test]
    fn next_unlock_none_iff_fully_released() {
        let s = schedule(60, 0);
        for h in 0..100 {
            let full = s.compute_released(h) == s.total_granted;
            assert_eq!(s.compute_next_unlock_height(h).is_none(), full, "h={h}");
        }
    }

    #[test]
    fn height_before_grant_counts_as_first_step() {
        let s = schedule(100, 100);
        assert_eq!(s.compute_released(50), tokens(25));
        assert_eq!(s.compute_next_unlock_height(50), Some(110));
    }

    #[test]
    fn grant_smaller_than_step_is_released_at_once() {
        let s = schedule(10, 7);
        assert_eq!(s.compute_released(7), tokens(10));
        assert_eq!(s.compute_next_unlock_height(7), None);
    }

    #[test]
    fn later_grant_overwrites_without_accumulating() {
        let mut engine = VestingEngine::default();
        assert_eq!(engine.on_approval_grant(OWNER, SPENDER, tokens(40), 10), GrantOutcome::Created);
        assert!(engine.on_delegated_spend(OWNER, SPENDER, tokens(5), 11));
        assert_eq!(engine.on_approval_grant(OWNER, SPENDER, tokens(60), 12), GrantOutcome::Replaced);

        let key = VestingKey::new(OWNER, SPENDER);
        let s = engine.schedule(&key).unwrap();
        assert_eq!(s.total_granted, tokens(60));
        assert_eq!(s.grant_start_height, 12);
        assert_eq!(engine.spent(&key), Some(U256::ZERO));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn revoke_deletes_schedule_and_spend() {
        let mut engine = VestingEngine::default();
        engine.on_approval_grant(OWNER, SPENDER, tokens(100), 1);
        engine.on_delegated_spend(OWNER, SPENDER, tokens(10), 2);

        assert_eq!(engine.on_approval_grant(OWNER, SPENDER, U256::ZERO, 3), GrantOutcome::Revoked);
        let key = VestingKey::new(OWNER, SPENDER);
        assert!(engine.schedule(&key).is_none());
        assert!(engine.spent(&key).is_none());

        // spends after revoke are ignored until a new grant
        assert!(!engine.on_delegated_spend(OWNER, SPENDER, tokens(1), 4));
        assert!(engine.spent(&key).is_none());

        engine.on_approval_grant(OWNER, SPENDER, tokens(50), 5);
        assert!(engine.on_delegated_spend(OWNER, SPENDER, tokens(1), 6));
        assert_eq!(engine.spent(&key), Some(tokens(1)));
    }

    #[test]
    fn revoke_of_absent_key_is_noop() {
        let mut engine = VestingEngine::default();
        assert_eq!(
            engine.on_approval_grant(OWNER, SPENDER, U256::ZERO, 1),
            GrantOutcome::NoSchedule
        );
        assert!(engine.is_empty());
    }

    #[test]
    fn spend_for_unknown_pair_is_ignored() {
        let mut engine = VestingEngine::default();
        engine.on_approval_grant(OWNER, SPENDER, tokens(100), 1);
        assert!(!engine.on_delegated_spend(SPENDER, OWNER, tokens(1), 2));
        assert!(engine.spent(&VestingKey::new(SPENDER, OWNER)).is_none());
    }

    #[test]
    fn view_renders_decimal_amounts() {
        let mut engine = VestingEngine::default();
        engine.on_approval_grant(OWNER, SPENDER, tokens(100), 100);
        engine.on_delegated_spend(OWNER, SPENDER, tokens(10), 101);

        let views = engine.view(100, 18);
        assert_eq!(views.len(), 1);
        let v = &views[0];
        assert_eq!(v.owner, OWNER.to_checksum(None));
        assert_eq!(v.total, "100.0");
        assert_eq!(v.released, "25.0");
        assert_eq!(v.spent, "10.0");
        assert_eq!(v.available, "15.0");
        assert_eq!(v.unlock_step_amount, "25.0");
        assert_eq!(v.grant_start_height, 100);
        assert_eq!(v.unlock_interval_heights, 10);
        assert_eq!(v.next_unlock_height, Some(110));
    }

    #[test]
    fn available_never_negative() {
        let mut engine = VestingEngine::default();
        engine.on_approval_grant(OWNER, SPENDER, tokens(100), 100);
        engine.on_delegated_spend(OWNER, SPENDER, tokens(40), 100);
        let v = &engine.view(100, 18)[0];
        assert_eq!(v.released, "25.0");
        assert_eq!(v.available, "0.0");
    }

    #[test]
    fn view_serializes_client_field_names() {
        let mut engine = VestingEngine::default();
        engine.on_approval_grant(OWNER, SPENDER, tokens(100), 200);
        let json = serde_json::to_value(&engine.view(300, 18)[0]).unwrap();
        assert_eq!(json["startBlock"], 200);
        assert_eq!(json["intervalBlocks"], 10);
        assert_eq!(json["step"], "25.0");
        assert!(json["nextReleaseBlock"].is_null());
    }

    #[test]
    fn policy_validation() {
        assert!(VestingPolicy::default().validate().is_ok());
        assert!(VestingPolicy::new(tokens(1), 0).validate().is_err());
        assert!(VestingPolicy::new(U256::ZERO, 10).validate().is_err());
    }
}
