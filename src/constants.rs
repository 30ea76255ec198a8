//! Application constants for the ITAG ingester
//!
//! Literals of the ITAG file format, storage target defaults and tuning
//! defaults used throughout the crate.

// =============================================================================
// File Format
// =============================================================================

/// Required value of the header FILE_TYPE field
pub const ITAG_FILE_TYPE: &str = "ITAG";

/// Minimum length of the header line (sum of the nine field widths)
pub const HEADER_MIN_WIDTH: usize = 61;

/// Minimum length of a detail line (agency + serial + status)
pub const DETAIL_MIN_WIDTH: usize = 17;

/// Line number of the header
pub const HEADER_LINE_NUMBER: u64 = 1;

/// Header field widths in file order
pub mod header_widths {
    pub const FILE_TYPE: usize = 4;
    pub const FROM_AGENCY_ID: usize = 3;
    pub const FILE_DATE: usize = 8;
    pub const FILE_TIME: usize = 6;
    pub const RECORD_COUNT: usize = 8;
    pub const COUNT_STAT: usize = 8;
}

/// Detail field widths in file order
pub mod detail_widths {
    pub const TAG_AGENCY_ID: usize = 3;
    pub const TAG_SERIAL_NUMBER: usize = 13;
    pub const TAG_STATUS: usize = 1;
}

/// Recognised TAG_STATUS codes
pub const STATUS_CODES: &[&str] = &["1", "2", "3", "4"];

// =============================================================================
// Storage Target
// =============================================================================

/// Default relational target for accepted tag records
pub const DEFAULT_TARGET_TABLE: &str = "itag_tag_status";

/// Target columns in load order
pub const TARGET_COLUMNS: &[&str] = &[
    "tag_agency_id",
    "tag_serial_number",
    "tag_status",
    "processed_at",
];

/// Rendering of the run-wide ingestion timestamp
pub const PROCESSED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// =============================================================================
// Error Log
// =============================================================================

/// Line identifier used for end-of-run reconciliation entries
pub const END_OF_RUN_MARKER: &str = "END";

/// Default error log file, relative to the working directory
pub const DEFAULT_ERROR_LOG: &str = "ingestion_error.log";

// =============================================================================
// Performance Defaults
// =============================================================================

/// Accepted records per transactional flush
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// Detail lines handed to one validation task
pub const DEFAULT_CHUNK_LINES: usize = 8_192;

/// Upper bound on validation workers
pub const MAX_WORKERS: usize = 256;

/// Initial capacity of the line read buffer
pub const LINE_BUFFER_CAPACITY: usize = 256;

// =============================================================================
// CLI Defaults
// =============================================================================

/// Error log entries printed by the check command
pub const DEFAULT_SHOW_ENTRIES: usize = 20;

/// Exit status of the check command when the error log is non-empty
pub const EXIT_ISSUES_FOUND: i32 = 2;
