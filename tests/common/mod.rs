//! Shared helpers for ITAG integration tests

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use itag_ingest::app::services::batch::{Batch, BatchSink, TagRow};
use itag_ingest::{Error, Result};
use tempfile::NamedTempFile;

/// Header line declaring `record_count` and the four status counts
pub fn header_line(record_count: u64, stats: [u64; 4]) -> String {
    format!(
        "ITAG00120250101083000{:08}{:08}{:08}{:08}{:08}",
        record_count, stats[0], stats[1], stats[2], stats[3]
    )
}

/// Detail line with agency `001`, a serial derived from `n` and `status`
pub fn detail_line(n: u64, status: u8) -> String {
    format!("001{:013}{}", n, status)
}

/// Write `lines` to a temporary file, newline-terminated
pub fn write_itag_file(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

pub fn fixed_processed_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_micro_opt(9, 0, 0, 0)
        .unwrap()
}

/// In-memory sink sharing its batches with the test
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub batches: Arc<Mutex<Vec<Vec<TagRow>>>>,
    pub fail_on_sequence: Option<usize>,
}

impl MemorySink {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn row_count(&self) -> usize {
        self.batches.lock().unwrap().iter().map(Vec::len).sum()
    }
}

impl BatchSink for MemorySink {
    async fn write_batch(&mut self, batch: &Batch) -> Result<u64> {
        if self.fail_on_sequence == Some(batch.sequence) {
            return Err(Error::sink_flush(
                batch.sequence,
                batch.len(),
                "rejected by test sink",
                std::io::Error::other("unique violation"),
            ));
        }
        self.batches.lock().unwrap().push(batch.rows.clone());
        Ok(batch.len() as u64)
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}
