//! `vestindex.yaml`: process configuration.

use std::net::SocketAddr;
use std::path::Path;

use alloy_primitives::{address, Address};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vestindex_core::indexer::IndexerConfig;
use vestindex_core::vesting::VestingPolicy;
use vestindex_evm::RetryConfig;
use vestindex_observability::LogConfig;

/// First contract deployed by the default Hardhat/Anvil account.
pub const DEFAULT_CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON-RPC endpoint of the ledger.
    pub rpc_url: String,
    /// ERC-20 contract to index.
    pub contract_address: Address,
    /// Address the HTTP API binds to.
    pub listen_addr: SocketAddr,
    pub indexer: IndexerConfig,
    pub log: LogConfig,
    pub retry: RetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.into(),
            contract_address: DEFAULT_CONTRACT,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 4000)),
            indexer: IndexerConfig::default(),
            log: LogConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("parsing config YAML")
    }

    /// Load from `path`, or use defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("in {}", path.display()))
    }

    /// Adopt the token's real decimals. A vesting policy left at its default
    /// is rescaled so the step stays 25 whole tokens.
    pub fn apply_token_decimals(&mut self, decimals: u8) {
        if self.indexer.token_decimals == decimals {
            return;
        }
        let default_policy = VestingPolicy::with_decimals(self.indexer.token_decimals);
        if self.indexer.vesting.unlock_step_amount == default_policy.unlock_step_amount {
            self.indexer.vesting.unlock_step_amount =
                VestingPolicy::with_decimals(decimals).unlock_step_amount;
        }
        self.indexer.token_decimals = decimals;
    }
}
