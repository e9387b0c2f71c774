//! `vestindex run`: the indexer process.
//!
//! Startup: token metadata (best effort) → initial cursor → poll loop task
//! and API task. Ctrl-C flips a `watch` channel that stops both.

use anyhow::{Context, Result};
use tokio::sync::watch;

use vestindex_core::query::QueryFacade;
use vestindex_core::state::IndexState;
use vestindex_evm::{initial_cursor, HttpLedgerClient, PollLoop, PollLoopEvent};
use vestindex_observability::IndexerMetrics;

use crate::config::AppConfig;

pub async fn run(mut config: AppConfig) -> Result<()> {
    let client = HttpLedgerClient::new(&config.rpc_url, config.contract_address, config.retry.clone())
        .context("creating ledger client")?;

    let token = match client.token_info().await {
        Ok(info) => {
            tracing::info!(name = %info.name, symbol = %info.symbol, decimals = info.decimals, "token metadata loaded");
            config.apply_token_decimals(info.decimals);
            Some(info)
        }
        Err(e) => {
            tracing::warn!(error = %e, "token metadata unavailable, /token will return 404");
            None
        }
    };

    config.indexer.validate().context("invalid indexer config")?;
    let cursor = initial_cursor(&client, &config.indexer)
        .await
        .context("reading chain head for the initial cursor")?;

    tracing::info!(
        rpc = %config.rpc_url,
        contract = %config.contract_address,
        first_block = cursor.next_block(),
        "starting indexer"
    );

    let state = IndexState::new(&config.indexer, cursor).shared();
    let mut facade = QueryFacade::new(state.clone());
    if let Some(info) = token {
        facade = facade.with_token(info);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = IndexerMetrics::global();
    let mut poll = PollLoop::new(config.indexer.clone(), client, state);
    let poll_task = tokio::spawn(async move {
        poll.run(shutdown_rx, move |event| record(&metrics, &event)).await;
    });

    let mut api_shutdown = shutdown_tx.subscribe();
    let mut api_task = tokio::spawn(vestindex_api::serve(config.listen_addr, facade, async move {
        while !*api_shutdown.borrow_and_update() {
            if api_shutdown.changed().await.is_err() {
                break;
            }
        }
    }));

    let early_exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            tracing::info!("shutdown requested");
            None
        }
        res = &mut api_task => Some(res),
    };

    let _ = shutdown_tx.send(true);
    let api_result = match early_exit {
        Some(res) => res,
        None => api_task.await,
    };
    poll_task.await.context("poll loop task panicked")?;
    api_result.context("API task panicked")??;
    Ok(())
}

fn record(metrics: &IndexerMetrics, event: &PollLoopEvent) {
    match event {
        PollLoopEvent::Committed(report) => metrics.record_committed(
            report.from_block,
            report.to_block,
            report.transfers as u64,
            report.approvals as u64,
            report.spends as u64,
            report.decode_skipped as u64,
        ),
        PollLoopEvent::Failed { error } => metrics.record_failed(error.kind()),
        PollLoopEvent::Idle { .. } => {}
    }
}
