//! Error types for the vestindex pipeline.

use thiserror::Error;

/// Errors that can occur while indexing.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid log in tx {tx_hash}: {reason}")]
    InvalidLog { tx_hash: String, reason: String },

    #[error("Block {0} not found")]
    BlockNotFound(u64),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    /// Returns `true` if retrying the same pass later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::BlockNotFound(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rpc(_) => "rpc",
            Self::Decode(_) => "decode",
            Self::InvalidLog { .. } => "invalid_log",
            Self::BlockNotFound(_) => "block_not_found",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }
}
