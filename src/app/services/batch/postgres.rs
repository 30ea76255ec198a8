//! Postgres bulk-load sink
//!
//! Each batch is streamed through `COPY ... FROM STDIN` inside its own
//! transaction. A failed batch is rolled back when the transaction is dropped,
//! and the error aborts the run; earlier batches stay committed.

use sqlx::{Connection, PgConnection};
use tracing::{debug, info};

use super::sink::{Batch, BatchSink, SinkTarget};
use crate::{Error, Result};

/// Sink holding a single Postgres connection for the whole run
pub struct PostgresSink {
    conn: PgConnection,
    target: SinkTarget,
    copy_statement: String,
}

impl PostgresSink {
    /// Open the connection used for every batch of this run
    pub async fn connect(database_url: &str, target: SinkTarget) -> Result<Self> {
        let conn = PgConnection::connect(database_url)
            .await
            .map_err(|e| Error::sink_connect("Failed to connect to Postgres", e))?;

        info!("Connected to Postgres, loading into {}", target.table);

        let copy_statement = target.copy_statement();
        Ok(Self {
            conn,
            target,
            copy_statement,
        })
    }

    /// Create the target table when it does not exist yet
    pub async fn ensure_table(&mut self) -> Result<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                tag_agency_id CHAR(3) NOT NULL,
                tag_serial_number CHAR(13) NOT NULL,
                tag_status SMALLINT NOT NULL,
                processed_at TIMESTAMP NOT NULL
            )",
            self.target.table
        );

        sqlx::query(&ddl)
            .execute(&mut self.conn)
            .await
            .map_err(|e| {
                Error::sink_connect(format!("Failed to create table {}", self.target.table), e)
            })?;

        debug!("Ensured table {} exists", self.target.table);
        Ok(())
    }
}

impl BatchSink for PostgresSink {
    async fn write_batch(&mut self, batch: &Batch) -> Result<u64> {
        if batch.is_empty() {
            debug!("Batch {} is empty, nothing to copy", batch.sequence);
            return Ok(0);
        }

        let sequence = batch.sequence;
        let rows = batch.len();
        let flush_error = |message: &str, e: sqlx::Error| {
            Error::sink_flush(sequence, rows, message.to_string(), e)
        };

        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| flush_error("BEGIN failed", e))?;

        let mut copy = tx
            .copy_in_raw(&self.copy_statement)
            .await
            .map_err(|e| flush_error("COPY could not start", e))?;
        copy.send(batch.to_copy_text().into_bytes())
            .await
            .map_err(|e| flush_error("COPY data rejected", e))?;
        let copied = copy
            .finish()
            .await
            .map_err(|e| flush_error("COPY did not complete", e))?;

        tx.commit()
            .await
            .map_err(|e| flush_error("COMMIT failed", e))?;

        debug!("Committed batch {} ({} rows)", sequence, copied);
        Ok(copied)
    }

    async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| Error::sink_connect("Failed to close Postgres connection", e))
    }
}
