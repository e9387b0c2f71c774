//! Bounded transfer history, newest first.

use std::collections::VecDeque;

use crate::types::TransferRecord;

/// Default number of retained transfers.
pub const DEFAULT_TRANSFER_LOG_CAPACITY: usize = 10;

/// Keeps the `capacity` most recent transfers; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct TransferLog {
    records: VecDeque<TransferRecord>,
    capacity: usize,
}

impl TransferLog {
    /// A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn append(&mut self, record: TransferRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Up to `capacity` records, most recent first.
    pub fn recent(&self) -> Vec<TransferRecord> {
        self.records.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TransferLog {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSFER_LOG_CAPACITY)
    }
}
