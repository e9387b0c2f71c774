//! `vestindex info`: check connectivity and print what the indexer would see.

use anyhow::{Context, Result};

use vestindex_evm::{HttpLedgerClient, LedgerClient};

use crate::config::AppConfig;

pub async fn run(config: &AppConfig) -> Result<()> {
    let client = HttpLedgerClient::new(&config.rpc_url, config.contract_address, config.retry.clone())
        .context("creating ledger client")?;

    let head = client
        .current_height()
        .await
        .with_context(|| format!("eth_blockNumber on {}", config.rpc_url))?;

    println!("vestindex v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("  RPC:        {}", config.rpc_url);
    println!("  Contract:   {}", config.contract_address.to_checksum(None));
    println!("  Chain head: {head}");

    match client.token_info().await {
        Ok(info) => {
            println!("  Token:      {} ({})", info.name, info.symbol);
            println!("  Decimals:   {}", info.decimals);
            println!("  Supply:     {}", info.total_supply);
        }
        Err(e) => println!("  Token:      unavailable ({e})"),
    }

    let policy = &config.indexer.vesting;
    println!();
    println!(
        "  Vesting:    {} base units every {} blocks",
        policy.unlock_step_amount, policy.unlock_interval_heights
    );
    Ok(())
}
