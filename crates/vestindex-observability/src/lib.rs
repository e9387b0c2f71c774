//! # vestindex-observability
//!
//! Structured logging and OpenTelemetry metrics for vestindex.
//!
//! ## Built-in metrics
//! - `vestindex.passes_committed`: counter
//! - `vestindex.passes_failed`: counter, tagged with error kind
//! - `vestindex.events_applied`: counter, tagged with kind
//! - `vestindex.decode_skipped`: counter
//! - `vestindex.pass_range_blocks`: histogram
//!
//! Metrics go through the global meter provider, which is a no-op until the
//! embedding application installs one.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::IndexerMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
