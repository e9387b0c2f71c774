//! Indexer cursor: the highest block height whose effects are fully applied.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// The indexer's committed position in the chain.
///
/// The cursor only moves forward, and only when a whole pass commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Last block number whose transfers, approvals and delegated spends
    /// have all been applied.
    pub block_number: u64,
}

impl Cursor {
    /// Create a cursor that has processed everything up to `block_number`.
    pub fn new(block_number: u64) -> Self {
        Self { block_number }
    }

    /// Create a cursor whose first pass starts at `first_block`.
    pub fn starting_at(first_block: u64) -> Self {
        Self::new(first_block.saturating_sub(1))
    }

    /// Advance to `block_number`. Returns `false` (and leaves the cursor
    /// unchanged) if that would move it backwards or nowhere.
    pub fn advance(&mut self, block_number: u64) -> bool {
        if block_number <= self.block_number {
            return false;
        }
        self.block_number = block_number;
        true
    }

    /// Returns the next block to process (cursor + 1).
    pub fn next_block(&self) -> u64 {
        self.block_number + 1
    }

    /// The range a pass must scan to catch up with `head`, or `None` if the
    /// chain has not moved past the cursor.
    pub fn pending_range(&self, head: u64) -> Option<RangeInclusive<u64>> {
        if head <= self.block_number {
            None
        } else {
            Some(self.next_block()..=head)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advance() {
        let mut cursor = Cursor::new(100);
        assert!(cursor.advance(105));
        assert_eq!(cursor.block_number, 105);
    }

    #[test]
    fn cursor_never_moves_backwards() {
        let mut cursor = Cursor::new(100);
        assert!(!cursor.advance(100));
        assert!(!cursor.advance(99));
        assert_eq!(cursor.block_number, 100);
    }

    #[test]
    fn cursor_pending_range() {
        let cursor = Cursor::new(500);
        assert_eq!(cursor.pending_range(500), None);
        assert_eq!(cursor.pending_range(499), None);
        assert_eq!(cursor.pending_range(503), Some(501..=503));
    }

    #[test]
    fn cursor_starting_at_genesis() {
        assert_eq!(Cursor::starting_at(0).block_number, 0);
        assert_eq!(Cursor::starting_at(100).next_block(), 100);
    }
}
