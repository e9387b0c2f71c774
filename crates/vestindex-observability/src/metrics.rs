//! Indexer metrics definitions.
//!
//! All metrics use OpenTelemetry conventions.

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for the poll loop.
#[derive(Clone)]
pub struct IndexerMetrics {
    pub passes_committed: Counter<u64>,
    pub passes_failed: Counter<u64>,
    pub events_applied: Counter<u64>,
    pub decode_skipped: Counter<u64>,
    pub pass_range_blocks: Histogram<u64>,
}

impl IndexerMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            passes_committed: meter
                .u64_counter("vestindex.passes_committed")
                .with_description("Passes whose batch was committed")
                .init(),
            passes_failed: meter
                .u64_counter("vestindex.passes_failed")
                .with_description("Passes aborted before commit")
                .init(),
            events_applied: meter
                .u64_counter("vestindex.events_applied")
                .with_description("Transfers, approvals and delegated spends applied")
                .init(),
            decode_skipped: meter
                .u64_counter("vestindex.decode_skipped")
                .with_description("Contract calls whose input did not decode")
                .init(),
            pass_range_blocks: meter
                .u64_histogram("vestindex.pass_range_blocks")
                .with_description("Blocks covered by one committed pass")
                .init(),
        }
    }

    /// Metrics on the global `vestindex` meter.
    pub fn global() -> Self {
        Self::new(&global::meter("vestindex"))
    }

    pub fn record_committed(
        &self,
        from_block: u64,
        to_block: u64,
        transfers: u64,
        approvals: u64,
        spends: u64,
        decode_skipped: u64,
    ) {
        self.passes_committed.add(1, &[]);
        self.pass_range_blocks
            .record(to_block.saturating_sub(from_block) + 1, &[]);
        for (kind, n) in [("transfer", transfers), ("approval", approvals), ("delegated_spend", spends)] {
            if n > 0 {
                self.events_applied.add(n, &[KeyValue::new("kind", kind)]);
            }
        }
        if decode_skipped > 0 {
            self.decode_skipped.add(decode_skipped, &[]);
        }
    }

    pub fn record_failed(&self, error_kind: &'static str) {
        self.passes_failed
            .add(1, &[KeyValue::new("error_kind", error_kind)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_a_provider_is_a_no_op() {
        let metrics = IndexerMetrics::global();
        metrics.record_committed(10, 19, 3, 1, 0, 2);
        metrics.record_failed("rpc");
        metrics.clone().record_committed(20, 20, 0, 0, 0, 0);
    }
}
