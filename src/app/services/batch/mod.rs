//! Batched bulk loading of accepted records
//!
//! ## Architecture
//!
//! - [`buffer`] - threshold buffer exposing `append` and `drain`
//! - [`sink`] - the [`BatchSink`] contract, the [`Batch`] wire shape and the
//!   discard sink used for validation-only runs
//! - [`postgres`] - COPY-based bulk load into Postgres, one transaction per batch
//! - [`csv_file`] - the same COPY text appended to a local file
//! - [`adapter`] - [`BatchSinkAdapter`], which buffers rows and flushes full
//!   batches plus a final partial batch to a sink

pub mod adapter;
pub mod buffer;
pub mod csv_file;
pub mod postgres;
pub mod sink;

#[cfg(test)]
pub mod tests;

pub use adapter::{BatchSinkAdapter, SinkStats};
pub use buffer::BatchBuffer;
pub use csv_file::CsvFileSink;
pub use postgres::PostgresSink;
pub use sink::{Batch, BatchSink, DiscardSink, SinkTarget, TagRow};
