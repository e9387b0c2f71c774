//! Fluent builder API for indexer configuration.
//!
//! # Example
//!
//! ```rust
//! use vestindex_evm::IndexerBuilder;
//!
//! let config = IndexerBuilder::new()
//!     .start_block(1)
//!     .poll_interval_ms(1_000)
//!     .max_log_range(500)
//!     .unlock_interval_heights(20)
//!     .build_config();
//! assert_eq!(config.start_block, Some(1));
//! ```

use alloy_primitives::U256;

use vestindex_core::error::IndexerError;
use vestindex_core::indexer::IndexerConfig;
use vestindex_core::vesting::VestingPolicy;

/// Fluent builder for `IndexerConfig`.
#[derive(Default)]
pub struct IndexerBuilder {
    config: IndexerConfig,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self {
            config: IndexerConfig::default(),
        }
    }

    /// Start from an existing config (e.g. one loaded from YAML).
    pub fn from_config(config: IndexerConfig) -> Self {
        Self { config }
    }

    /// Set the first block to scan.
    pub fn start_block(mut self, block: u64) -> Self {
        self.config.start_block = Some(block);
        self
    }

    /// Start at the chain head seen at startup.
    pub fn start_at_head(mut self) -> Self {
        self.config.start_block = None;
        self
    }

    /// Set polling interval in milliseconds.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the number of blocks per `eth_getLogs` call.
    pub fn max_log_range(mut self, blocks: u64) -> Self {
        self.config.max_log_range = blocks;
        self
    }

    pub fn transfer_log_capacity(mut self, n: usize) -> Self {
        self.config.transfer_log_capacity = n;
        self
    }

    /// Set token decimals. Resets the vesting step to the default
    /// token amount in the new unit.
    pub fn token_decimals(mut self, decimals: u8) -> Self {
        self.config.token_decimals = decimals;
        let interval = self.config.vesting.unlock_interval_heights;
        self.config.vesting = VestingPolicy::with_decimals(decimals);
        self.config.vesting.unlock_interval_heights = interval;
        self
    }

    pub fn vesting_policy(mut self, policy: VestingPolicy) -> Self {
        self.config.vesting = policy;
        self
    }

    /// Set the unlock step in base units.
    pub fn unlock_step_amount(mut self, amount: U256) -> Self {
        self.config.vesting.unlock_step_amount = amount;
        self
    }

    /// Set blocks between unlock steps.
    pub fn unlock_interval_heights(mut self, heights: u64) -> Self {
        self.config.vesting.unlock_interval_heights = heights;
        self
    }

    /// Build the `IndexerConfig`.
    pub fn build_config(self) -> IndexerConfig {
        self.config
    }

    /// Build and validate the `IndexerConfig`.
    pub fn try_build_config(self) -> Result<IndexerConfig, IndexerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
