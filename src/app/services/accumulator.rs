//! Running totals of accepted records
//!
//! Counts are plain sums, so partial accumulators built over disjoint chunks
//! can be merged in any order and give the same [`RunSummary`].

use crate::models::{DetailRecord, RunSummary, StatusCounts, TagStatus};

/// Per-run counter of accepted records by status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    total: u64,
    by_status: StatusCounts,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one accepted record
    pub fn record(&mut self, record: &DetailRecord) {
        self.record_status(record.tag_status);
    }

    pub fn record_status(&mut self, status: TagStatus) {
        self.total += 1;
        self.by_status[status] += 1;
    }

    /// Fold another partial accumulator into this one
    pub fn merge(&mut self, other: &Accumulator) {
        self.total += other.total;
        for (status, count) in other.by_status.iter() {
            self.by_status[status] += count;
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, status: TagStatus) -> u64 {
        self.by_status[status]
    }

    /// Final snapshot handed to the reconciler
    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            actual_record_count: self.total,
            actual_status_counts: self.by_status,
        }
    }
}
