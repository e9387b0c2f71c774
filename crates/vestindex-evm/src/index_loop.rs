//! The poll loop: one writer that turns ledger ranges into committed passes.
//!
//! # One pass
//! 1. Read the chain height `H`; nothing to do if `H <= cursor`.
//! 2. Fetch `Transfer` logs for `[cursor + 1, H]`.
//! 3. Fetch `Approval` logs for the same range.
//! 4. Walk the blocks and decode `transferFrom` calls to the contract.
//! 5. Commit the buffered [`PassBatch`] under the write lock.
//!
//! Any error in steps 1-4 drops the batch. The state and cursor are
//! untouched, so the next tick scans the same range again.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use vestindex_core::cursor::Cursor;
use vestindex_core::error::IndexerError;
use vestindex_core::indexer::{IndexerConfig, PassPhase};
use vestindex_core::state::{ApplySummary, PassBatch, SharedState};

use crate::events::{delegated_spend, parse_approval, parse_transfer};
use crate::fetcher::LedgerFetcher;
use crate::ledger::{EventKind, LedgerClient};

/// What a committed pass covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub from_block: u64,
    pub to_block: u64,
    pub transfers: usize,
    pub approvals: usize,
    pub spends: usize,
    /// Transactions to the contract whose input did not decode.
    pub decode_skipped: usize,
    pub summary: ApplySummary,
}

/// Result of a single [`PollLoop::run_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Chain head has not moved past the cursor.
    Idle { head: u64, cursor: u64 },
    Committed(PassReport),
    /// The batch no longer extended past the cursor at commit time.
    Stale,
}

/// Status emitted by [`PollLoop::run`] for observability.
#[derive(Debug)]
pub enum PollLoopEvent {
    Committed(PassReport),
    Idle { head: u64 },
    Failed { error: IndexerError },
}

/// Drives passes against a [`LedgerClient`] and commits them to shared state.
pub struct PollLoop<C: LedgerClient> {
    config: IndexerConfig,
    fetcher: LedgerFetcher<C>,
    state: SharedState,
    phase: PassPhase,
}

impl<C: LedgerClient> PollLoop<C> {
    pub fn new(config: IndexerConfig, client: C, state: SharedState) -> Self {
        Self {
            config,
            fetcher: LedgerFetcher::new(client),
            state,
            phase: PassPhase::Idle,
        }
    }

    pub fn phase(&self) -> PassPhase {
        self.phase
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn client(&self) -> &C {
        self.fetcher.client()
    }

    /// Run one pass. On error the phase is reset to idle and nothing has
    /// been applied.
    pub async fn run_once(&mut self) -> Result<PassOutcome, IndexerError> {
        let result = self.pass().await;
        self.phase = PassPhase::Idle;
        result
    }

    async fn pass(&mut self) -> Result<PassOutcome, IndexerError> {
        self.phase = PassPhase::FetchingHeight;
        let head = self.fetcher.head_block_number().await?;
        let cursor = self.state.read().await.cursor();

        let Some(range) = cursor.pending_range(head) else {
            tracing::debug!(head, cursor = cursor.block_number, "no new blocks");
            return Ok(PassOutcome::Idle {
                head,
                cursor: cursor.block_number,
            });
        };
        let (from, to) = (*range.start(), *range.end());
        let max_range = self.config.max_log_range;
        let mut batch = PassBatch::new(from, to);

        self.phase = PassPhase::ScanningTransfers;
        for log in self.fetcher.logs(EventKind::Transfer, from, to, max_range).await? {
            if log.is_removed() {
                continue;
            }
            batch.transfers.push(parse_transfer(&log)?);
        }

        self.phase = PassPhase::ScanningApprovals;
        for log in self.fetcher.logs(EventKind::Approval, from, to, max_range).await? {
            if log.is_removed() {
                continue;
            }
            batch.approvals.push(parse_approval(&log)?);
        }

        self.phase = PassPhase::ScanningDelegatedSpend;
        let contract = self.fetcher.client().contract();
        let mut decode_skipped = 0usize;
        for number in range {
            let block = self.fetcher.block(number).await?;
            for tx in &block.transactions {
                if tx.to != Some(contract) || tx.input.is_empty() {
                    continue;
                }
                match self.fetcher.client().decode_call(&tx.input, contract) {
                    Ok(call) => {
                        if let Some(spend) = delegated_spend(tx, &call, number) {
                            batch.spends.push(spend);
                        }
                    }
                    Err(e) => {
                        decode_skipped += 1;
                        tracing::debug!(block = number, tx = %tx.hash, error = %e, "skipping undecodable call");
                    }
                }
            }
        }

        self.phase = PassPhase::Committing;
        let applied = self.state.write().await.apply(&batch);
        let Some(summary) = applied else {
            tracing::debug!(from, to, "batch no longer ahead of cursor, dropped");
            return Ok(PassOutcome::Stale);
        };

        tracing::info!(
            from,
            to,
            transfers = batch.transfers.len(),
            approvals = batch.approvals.len(),
            spends = batch.spends.len(),
            decode_skipped,
            "pass committed"
        );

        Ok(PassOutcome::Committed(PassReport {
            from_block: from,
            to_block: to,
            transfers: batch.transfers.len(),
            approvals: batch.approvals.len(),
            spends: batch.spends.len(),
            decode_skipped,
            summary,
        }))
    }

    /// Poll every `poll_interval_ms` until `shutdown` turns `true`.
    ///
    /// Ticks that fire while a pass is running are skipped. A failed pass is
    /// logged and retried on the next tick.
    pub async fn run<F>(&mut self, mut shutdown: watch::Receiver<bool>, mut on_event: F)
    where
        F: FnMut(PollLoopEvent),
    {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let cursor = self.state.read().await.cursor().block_number;
        tracing::info!(
            interval_ms = self.config.poll_interval_ms,
            cursor,
            "poll loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match self.run_once().await {
                Ok(PassOutcome::Committed(report)) => on_event(PollLoopEvent::Committed(report)),
                Ok(PassOutcome::Idle { head, .. }) => on_event(PollLoopEvent::Idle { head }),
                Ok(PassOutcome::Stale) => {}
                Err(error) => {
                    tracing::warn!(error = %error, "pass aborted, range will be retried");
                    on_event(PollLoopEvent::Failed { error });
                }
            }
        }

        tracing::info!("poll loop stopped");
    }
}

/// Where the cursor starts: just before `start_block`, or just before the
/// chain head if none is configured.
pub async fn initial_cursor<C: LedgerClient>(
    client: &C,
    config: &IndexerConfig,
) -> Result<Cursor, IndexerError> {
    match config.start_block {
        Some(first) => Ok(Cursor::starting_at(first)),
        None => Ok(Cursor::starting_at(client.current_height().await?)),
    }
}
