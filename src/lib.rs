//! ITAG Ingest Library
//!
//! Validating bulk loader for fixed-width ITAG toll-tag status files.
//!
//! This library provides tools for:
//! - Decoding the header and detail layouts with one declarative fixed-width decoder
//! - Validating every field and collecting all violations of a line together
//! - Counting accepted records by tag status
//! - Loading accepted records in transactional batches (Postgres COPY or a local file)
//! - Reconciling processed counts against the counts declared in the header
//! - Recording rejected lines and mismatches in an append-only error log

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Core application modules
pub mod app {
    pub mod services {
        pub mod accumulator;
        pub mod batch;
        pub mod error_log;
        pub mod header_parser;
        pub mod layout;
        pub mod pipeline;
        pub mod reconciler;
        pub mod record_parser;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::services::batch::{BatchSink, CsvFileSink, DiscardSink, PostgresSink, SinkTarget};
pub use app::services::error_log::{ErrorLog, IssueKind, LineId, LogEntry};
pub use app::services::pipeline::{IngestOutcome, IngestPipeline, RunReport};
pub use config::IngestConfig;
pub use error::{Error, Result};
pub use models::{DetailRecord, HeaderRecord, RunSummary, StatusCounts, TagStatus, ValidationOutcome};
