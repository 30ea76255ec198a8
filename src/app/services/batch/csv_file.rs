//! Local file sink writing COPY-ready text
//!
//! Useful when no database is reachable: the output can later be loaded with
//! `\copy itag_tag_status FROM 'file' WITH (FORMAT csv)`. Each batch is
//! synced to disk before the call returns, which is the commit boundary.

use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::sink::{Batch, BatchSink};
use crate::{Error, Result};

#[derive(Debug)]
pub struct CsvFileSink {
    path: PathBuf,
    file: File,
    rows_written: u64,
}

impl CsvFileSink {
    /// Open `path` for appending, creating it if needed
    pub async fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                Error::sink_connect(format!("Failed to open output file {}", path.display()), e)
            })?;

        info!("Writing accepted records to {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl BatchSink for CsvFileSink {
    async fn write_batch(&mut self, batch: &Batch) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let text = batch.to_copy_text();
        let flush_error = |message: &str, e: std::io::Error| {
            Error::sink_flush(batch.sequence, batch.len(), message.to_string(), e)
        };

        self.file
            .write_all(text.as_bytes())
            .await
            .map_err(|e| flush_error("write failed", e))?;
        self.file
            .sync_data()
            .await
            .map_err(|e| flush_error("sync failed", e))?;

        self.rows_written += batch.len() as u64;
        debug!(
            "Appended batch {} ({} rows) to {}",
            batch.sequence,
            batch.len(),
            self.path.display()
        );
        Ok(batch.len() as u64)
    }

    async fn close(mut self) -> Result<()> {
        self.file
            .flush()
            .await
            .map_err(|e| Error::io(format!("Failed to flush {}", self.path.display()), e))
    }
}
