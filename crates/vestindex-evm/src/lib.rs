//! vestindex-evm: EVM ledger access and the poll loop that feeds the
//! vestindex projections.

pub mod builder;
pub mod decoder;
pub mod events;
pub mod fetcher;
pub mod index_loop;
pub mod ledger;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod rpc;
pub mod transport;

pub use builder::IndexerBuilder;
pub use decoder::{AbiCallDecoder, DecodeError, DecodedCall};
pub use fetcher::LedgerFetcher;
pub use index_loop::{initial_cursor, PassOutcome, PassReport, PollLoop, PollLoopEvent};
pub use ledger::{EventKind, LedgerClient, RawBlock, RawLog, RawTransaction};
pub use rpc::HttpLedgerClient;
pub use transport::{HttpTransport, RetryConfig, TransportError};
