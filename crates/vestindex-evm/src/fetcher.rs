//! Ledger fetcher: range batching on top of a [`LedgerClient`].

use vestindex_core::error::IndexerError;

use crate::ledger::{EventKind, LedgerClient, RawBlock, RawLog};

/// Wraps a `LedgerClient` and splits log queries the node might reject
/// as too wide.
pub struct LedgerFetcher<C> {
    client: C,
}

impl<C: LedgerClient> LedgerFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the current chain head block number.
    pub async fn head_block_number(&self) -> Result<u64, IndexerError> {
        self.client.current_height().await
    }

    pub async fn block(&self, number: u64) -> Result<RawBlock, IndexerError> {
        self.client.get_block_with_transactions(number).await
    }

    /// Fetch all `event` logs in `[from, to]`, in chunks of at most
    /// `max_range` blocks. Order is preserved across chunks.
    pub async fn logs(
        &self,
        event: EventKind,
        from: u64,
        to: u64,
        max_range: u64,
    ) -> Result<Vec<RawLog>, IndexerError> {
        if to < from {
            return Ok(vec![]);
        }
        let span = max_range.max(1);
        if to - from < span {
            return self.client.get_logs(event, from, to).await;
        }
        let mut all_logs = Vec::new();
        let mut start = from;
        while start <= to {
            let end = start.saturating_add(span - 1).min(to);
            let chunk = self.client.get_logs(event, start, end).await?;
            all_logs.extend(chunk);
            if end == u64::MAX {
                break;
            }
            start = end + 1;
        }
        Ok(all_logs)
    }
}

/// Parse a hex-encoded quantity (with or without `0x`) to u64.
pub fn parse_hex_u64(s: &str) -> Result<u64, IndexerError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|e| IndexerError::Decode(format!("invalid hex quantity '{s}': {e}")))
}

/// Encode a u64 as a JSON-RPC hex quantity.
pub fn to_hex_quantity(n: u64) -> String {
    format!("{n:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLedger;
    use alloy_primitives::{Address, U256};

    #[test]
    fn parse_hex_u64_basic() {
        assert_eq!(parse_hex_u64("0x1").unwrap(), 1);
        assert_eq!(parse_hex_u64("0xff").unwrap(), 255);
        assert_eq!(parse_hex_u64("1234").unwrap(), 0x1234);
        assert!(parse_hex_u64("0xzz").is_err());
    }

    #[test]
    fn hex_quantity_encoding() {
        assert_eq!(to_hex_quantity(0), "0x0");
        assert_eq!(to_hex_quantity(436), "0x1b4");
    }

    #[tokio::test]
    async fn chunked_logs_keep_order() {
        let ledger = MockLedger::new(Address::repeat_byte(0xcc));
        for block in 1..=25u64 {
            ledger.push_transfer(Address::repeat_byte(1), Address::repeat_byte(2), U256::from(block), block);
        }
        let fetcher = LedgerFetcher::new(ledger);

        let logs = fetcher.logs(EventKind::Transfer, 1, 25, 10).await.unwrap();
        let blocks: Vec<u64> = logs.iter().map(|l| l.block_number_u64().unwrap()).collect();
        assert_eq!(blocks, (1..=25).collect::<Vec<_>>());
        assert_eq!(fetcher.client().log_queries(), 3);
    }

    #[tokio::test]
    async fn narrow_range_is_one_query() {
        let ledger = MockLedger::new(Address::repeat_byte(0xcc));
        let fetcher = LedgerFetcher::new(ledger);
        fetcher.logs(EventKind::Approval, 5, 9, 10).await.unwrap();
        assert_eq!(fetcher.client().log_queries(), 1);
        assert!(fetcher.logs(EventKind::Approval, 9, 5, 10).await.unwrap().is_empty());
    }
}
