//! Bulk-load sink contract
//!
//! A sink receives ordered batches of tag rows stamped with the run-wide
//! ingestion time. Each `write_batch` call is one commit boundary: the batch is
//! either durably stored in full or the call fails, and a failure is fatal to
//! the run. An empty batch must be accepted as a no-op.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::Result;
use crate::constants::{PROCESSED_AT_FORMAT, TARGET_COLUMNS};
use crate::models::{DetailRecord, TagStatus};

/// Persisted projection of an accepted detail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRow {
    pub tag_agency_id: String,
    pub tag_serial_number: String,
    pub tag_status: TagStatus,
}

impl From<DetailRecord> for TagRow {
    fn from(record: DetailRecord) -> Self {
        Self {
            tag_agency_id: record.tag_agency_id,
            tag_serial_number: record.tag_serial_number,
            tag_status: record.tag_status,
        }
    }
}

/// Named target and ordered column list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkTarget {
    pub table: String,
    pub columns: Vec<String>,
}

impl SinkTarget {
    /// Target with the standard tag status columns
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: TARGET_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// `COPY ... FROM STDIN` statement for this target
    pub fn copy_statement(&self) -> String {
        format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv)",
            self.table,
            self.columns.join(", ")
        )
    }
}

/// One flush worth of rows
#[derive(Debug, Clone)]
pub struct Batch {
    /// 1-based flush sequence number within the run
    pub sequence: usize,
    pub processed_at: NaiveDateTime,
    pub rows: Vec<TagRow>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Comma-joined tuples, one per line, in target column order
    pub fn to_copy_text(&self) -> String {
        let stamp = self.processed_at.format(PROCESSED_AT_FORMAT).to_string();
        let mut text = String::with_capacity(self.rows.len() * (stamp.len() + 24));
        for row in &self.rows {
            text.push_str(&row.tag_agency_id);
            text.push(',');
            text.push_str(&row.tag_serial_number);
            text.push(',');
            text.push_str(&row.tag_status.to_string());
            text.push(',');
            text.push_str(&stamp);
            text.push('\n');
        }
        text
    }
}

/// Destination for accepted rows
#[allow(async_fn_in_trait)]
pub trait BatchSink {
    /// Commit every row of `batch` or fail; returns the rows stored
    async fn write_batch(&mut self, batch: &Batch) -> Result<u64>;

    /// Release the sink after the final batch
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Sink that counts rows and stores nothing
#[derive(Debug, Default)]
pub struct DiscardSink {
    rows_seen: u64,
}

impl DiscardSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }
}

impl BatchSink for DiscardSink {
    async fn write_batch(&mut self, batch: &Batch) -> Result<u64> {
        self.rows_seen += batch.len() as u64;
        debug!("Discarded batch {} ({} rows)", batch.sequence, batch.len());
        Ok(batch.len() as u64)
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}
