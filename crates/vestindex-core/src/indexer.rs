//! Indexer configuration and pass phases.

use serde::{Deserialize, Serialize};

use crate::error::IndexerError;
use crate::transfers::DEFAULT_TRANSFER_LOG_CAPACITY;
use crate::vesting::VestingPolicy;

/// Configuration for an indexer instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// First block to scan. `None` = start at the chain head seen at startup.
    pub start_block: Option<u64>,
    /// Maximum block span per `eth_getLogs` call.
    pub max_log_range: u64,
    /// Number of transfers retained in the recent-transfer log.
    pub transfer_log_capacity: usize,
    /// Token decimals used when rendering amounts.
    pub token_decimals: u8,
    /// Release policy applied to every vesting schedule.
    pub vesting: VestingPolicy,
}

impl IndexerConfig {
    /// Reject values the indexer cannot run with.
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.poll_interval_ms == 0 {
            return Err(IndexerError::Config("poll_interval_ms must be greater than zero".into()));
        }
        if self.max_log_range == 0 {
            return Err(IndexerError::Config("max_log_range must be greater than zero".into()));
        }
        if self.transfer_log_capacity == 0 {
            return Err(IndexerError::Config(
                "transfer_log_capacity must be greater than zero".into(),
            ));
        }
        self.vesting.validate()
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            start_block: None,
            max_log_range: 1000,
            transfer_log_capacity: DEFAULT_TRANSFER_LOG_CAPACITY,
            token_decimals: 18,
            vesting: VestingPolicy::default(),
        }
    }
}

/// Where the poll loop currently is within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassPhase {
    Idle,
    FetchingHeight,
    ScanningTransfers,
    ScanningApprovals,
    ScanningDelegatedSpend,
    Committing,
}

impl std::fmt::Display for PassPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::FetchingHeight => write!(f, "fetching-height"),
            Self::ScanningTransfers => write!(f, "scanning-transfers"),
            Self::ScanningApprovals => write!(f, "scanning-approvals"),
            Self::ScanningDelegatedSpend => write!(f, "scanning-delegated-spend"),
            Self::Committing => write!(f, "committing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn defaults_match_policy_constants() {
        let cfg = IndexerConfig::default();
        assert_eq!(cfg.poll_interval_ms, 2000);
        assert_eq!(cfg.transfer_log_capacity, 10);
        assert_eq!(cfg.vesting.unlock_interval_heights, 10);
        assert_eq!(
            cfg.vesting.unlock_step_amount,
            U256::from(25u64) * U256::from(10u64).pow(U256::from(18u64))
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_values() {
        let cfg = IndexerConfig {
            max_log_range: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = IndexerConfig {
            transfer_log_capacity: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = IndexerConfig::default();
        cfg.vesting.unlock_interval_heights = 0;
        assert!(matches!(cfg.validate(), Err(IndexerError::Config(_))));
    }

    #[test]
    fn phase_display() {
        assert_eq!(PassPhase::ScanningDelegatedSpend.to_string(), "scanning-delegated-spend");
        assert_eq!(PassPhase::Idle.to_string(), "idle");
    }
}
