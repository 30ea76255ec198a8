//! Error handling for ITAG ingestion runs.
//!
//! Only conditions that abort a run live here. Malformed headers, rejected
//! detail lines and count mismatches are data findings and travel through the
//! error log instead (see [`crate::app::services::error_log`]).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the ITAG ingester
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error types for ingestion operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Input file does not exist
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Could not acquire the sink
    #[error("Sink connection failed: {message}")]
    SinkConnect {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A batch could not be committed
    #[error("Flush of batch {sequence} ({rows} records) failed: {message}")]
    SinkFlush {
        sequence: usize,
        rows: usize,
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A validation task failed to complete
    #[error("Validation worker failed: {message}")]
    Worker { message: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an input not found error
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a sink connection error
    pub fn sink_connect(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SinkConnect {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Create a batch flush error
    pub fn sink_flush(
        sequence: usize,
        rows: usize,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SinkFlush {
            sequence,
            rows,
            message: message.into(),
            source: source.into(),
        }
    }

    /// Create a worker failure error
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Whether this error came from the bulk-load sink
    pub fn is_sink_failure(&self) -> bool {
        matches!(self, Self::SinkConnect { .. } | Self::SinkFlush { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Worker {
            message: error.to_string(),
        }
    }
}
