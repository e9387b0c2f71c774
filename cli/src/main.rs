//! vestindex CLI: run the ERC-20 vesting indexer and inspect its inputs.
//!
//! # Commands
//! ```text
//! vestindex run     [--config <path>] [--rpc-url <url>] [--contract <addr>] [--listen <addr>] [--start-block <n>]
//! vestindex info    [--config <path>] [--rpc-url <url>] [--contract <addr>]
//! vestindex preview --amount <tokens> --start <height> [--step <tokens>] [--interval <blocks>] [--until <height>]
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use alloy_primitives::Address;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod cmd_info;
mod cmd_preview;
mod cmd_run;
mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(
    name = "vestindex",
    about = "Event-sourced ERC-20 balance, transfer and vesting indexer",
    long_about = "
vestindex polls an EVM JSON-RPC node, folds Transfer and Approval logs plus
transferFrom calls into in-memory projections, and serves them over HTTP.

ENVIRONMENT VARIABLES:
  RUST_LOG    overrides the log filter from the config file
",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where to find the ledger. Flags override the config file.
#[derive(Args)]
struct LedgerArgs {
    /// Path to a vestindex.yaml config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// JSON-RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,
    /// ERC-20 contract address
    #[arg(long)]
    contract: Option<Address>,
}

impl LedgerArgs {
    fn load(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(contract) = self.contract {
            config.contract_address = contract;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Index the contract and serve the HTTP API until Ctrl-C
    Run {
        #[command(flatten)]
        ledger: LedgerArgs,
        /// HTTP API listen address (default: 127.0.0.1:4000)
        #[arg(long)]
        listen: Option<SocketAddr>,
        /// First block to index (default: current chain head)
        #[arg(long)]
        start_block: Option<u64>,
    },

    /// Print token metadata and chain head, then exit
    Info {
        #[command(flatten)]
        ledger: LedgerArgs,
    },

    /// Print the release table of a vesting grant, offline
    Preview {
        /// Granted amount in whole tokens
        #[arg(long)]
        amount: u64,
        /// Block height of the grant
        #[arg(long)]
        start: u64,
        /// Tokens unlocked per step
        #[arg(long, default_value_t = vestindex_core::vesting::DEFAULT_UNLOCK_STEP_TOKENS)]
        step: u64,
        /// Blocks between steps
        #[arg(long, default_value_t = vestindex_core::vesting::DEFAULT_UNLOCK_INTERVAL_HEIGHTS)]
        interval: u64,
        /// Token decimals
        #[arg(long, default_value_t = 18)]
        decimals: u8,
        /// Stop the table at this height (default: when fully released)
        #[arg(long)]
        until: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { ledger, listen, start_block } => {
            let mut config = ledger.load()?;
            if let Some(addr) = listen {
                config.listen_addr = addr;
            }
            if start_block.is_some() {
                config.indexer.start_block = start_block;
            }
            vestindex_observability::init_tracing(&config.log);
            cmd_run::run(config).await
        }

        Commands::Info { ledger } => {
            let config = ledger.load()?;
            vestindex_observability::init_tracing(&config.log);
            cmd_info::run(&config).await
        }

        Commands::Preview { amount, start, step, interval, decimals, until } => {
            cmd_preview::run(amount, start, step, interval, decimals, until)
        }
    }
}
