//! vestindex-core: projections for an event-sourced ERC-20 ledger indexer.
//!
//! # Architecture
//!
//! ```text
//! PollLoop (vestindex-evm) ──► PassBatch ──► IndexState::apply
//!                                              ├── BalanceProjection (address → balance)
//!                                              ├── TransferLog       (bounded, newest first)
//!                                              ├── VestingEngine     (schedules + delegated spend)
//!                                              └── Cursor            (last committed height)
//!
//! QueryFacade ──► read-only snapshots for the HTTP layer
//! ```
//!
//! Nothing here performs I/O. The poll loop fetches a whole block range,
//! buffers it in a [`PassBatch`], and hands it over in one commit.

pub mod amount;
pub mod balances;
pub mod cursor;
pub mod error;
pub mod indexer;
pub mod query;
pub mod state;
pub mod transfers;
pub mod types;
pub mod vesting;

pub use balances::BalanceProjection;
pub use cursor::Cursor;
pub use error::IndexerError;
pub use indexer::{IndexerConfig, PassPhase};
pub use query::{IndexerStatus, QueryFacade, TransferView};
pub use state::{ApplySummary, IndexState, PassBatch, SharedState};
pub use transfers::TransferLog;
pub use types::{ApprovalEvent, DelegatedSpend, TokenInfo, TransferEvent, TransferRecord, VestingKey};
pub use vesting::{GrantOutcome, VestingEngine, VestingPolicy, VestingSchedule, VestingView};
