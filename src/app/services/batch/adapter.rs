//! Buffering adapter between the record stream and a bulk-load sink

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use super::buffer::BatchBuffer;
use super::sink::{Batch, BatchSink, TagRow};
use crate::Result;
use crate::models::DetailRecord;

/// Flush history of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
    /// Row count of every flush in order, including the final one
    pub batch_sizes: Vec<usize>,
    pub rows_committed: u64,
}

impl SinkStats {
    pub fn flushes(&self) -> usize {
        self.batch_sizes.len()
    }
}

/// Groups accepted records into fixed-size batches for a sink
///
/// Owns the sink for the duration of the run. A full buffer is flushed before
/// the next record is accepted; [`finish`](Self::finish) always flushes the
/// remainder, even when it is empty, and then releases the sink.
pub struct BatchSinkAdapter<S: BatchSink> {
    sink: S,
    buffer: BatchBuffer<TagRow>,
    processed_at: NaiveDateTime,
    stats: SinkStats,
}

impl<S: BatchSink> BatchSinkAdapter<S> {
    pub fn new(sink: S, batch_size: usize, processed_at: NaiveDateTime) -> Self {
        Self {
            sink,
            buffer: BatchBuffer::new(batch_size),
            processed_at,
            stats: SinkStats::default(),
        }
    }

    /// Buffer one record, flushing when the batch size is reached
    pub async fn push(&mut self, record: DetailRecord) -> Result<()> {
        if self.buffer.append(TagRow::from(record)) {
            self.flush().await?;
        }
        Ok(())
    }

    /// Rows waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }

    async fn flush(&mut self) -> Result<u64> {
        let batch = Batch {
            sequence: self.stats.batch_sizes.len() + 1,
            processed_at: self.processed_at,
            rows: self.buffer.drain(),
        };

        let committed = self.sink.write_batch(&batch).await?;
        self.stats.batch_sizes.push(batch.len());
        self.stats.rows_committed += committed;

        if batch.is_empty() {
            debug!("Final flush had no rows");
        } else {
            info!(
                "Flushed batch {} ({} records, {} committed so far)",
                batch.sequence,
                batch.len(),
                self.stats.rows_committed
            );
        }
        Ok(committed)
    }

    /// Flush the final partial batch and release the sink
    pub async fn finish(mut self) -> Result<SinkStats> {
        self.flush().await?;
        self.sink.close().await?;
        Ok(self.stats)
    }
}
