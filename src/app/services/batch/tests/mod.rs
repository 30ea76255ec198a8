//! Test utilities for the batch sink layer
//!
//! Provides a recording sink that keeps every batch it receives and can be
//! told to fail on a given flush, plus small record builders.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::sink::{Batch, BatchSink, TagRow};
use crate::models::{DetailRecord, TagStatus};
use crate::{Error, Result};

mod adapter_tests;

/// Shared view of what a [`RecordingSink`] received
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    batches: Arc<Mutex<Vec<Vec<TagRow>>>>,
    closed: Arc<AtomicBool>,
}

impl Recorded {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn rows(&self) -> Vec<TagRow> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Sink that records batches in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    recorded: Recorded,
    fail_on_sequence: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> (Self, Recorded) {
        let sink = Self::default();
        let recorded = sink.recorded.clone();
        (sink, recorded)
    }

    /// Sink whose flush number `sequence` fails
    pub fn failing_on(sequence: usize) -> (Self, Recorded) {
        let (mut sink, recorded) = Self::new();
        sink.fail_on_sequence = Some(sequence);
        (sink, recorded)
    }
}

impl BatchSink for RecordingSink {
    async fn write_batch(&mut self, batch: &Batch) -> Result<u64> {
        if self.fail_on_sequence == Some(batch.sequence) {
            return Err(Error::sink_flush(
                batch.sequence,
                batch.len(),
                "simulated failure",
                std::io::Error::other("connection reset"),
            ));
        }
        self.recorded
            .batches
            .lock()
            .unwrap()
            .push(batch.rows.clone());
        Ok(batch.len() as u64)
    }

    async fn close(self) -> Result<()> {
        self.recorded.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Fixed ingestion timestamp for tests
pub fn test_processed_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_micro_opt(10, 30, 0, 123_456)
        .unwrap()
}

/// Accepted record with a serial derived from `n`
pub fn test_record(n: u64, status: TagStatus) -> DetailRecord {
    DetailRecord {
        tag_agency_id: "001".to_string(),
        tag_serial_number: format!("{:013}", n),
        tag_status: status,
        acct_info: None,
    }
}
