//! Command-line argument definitions for the ITAG ingester
//!
//! Defines the CLI interface using the clap derive API.

use crate::constants::{DEFAULT_SHOW_ENTRIES, MAX_WORKERS};
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the ITAG toll-tag status ingester
///
/// Validates fixed-width ITAG files against their header manifest and bulk
/// loads the accepted records.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "itag-ingest",
    version,
    about = "Validate and bulk load ITAG toll-tag status files",
    long_about = "Reads a fixed-width ITAG file, validates the header and every detail record, \
                  loads accepted records in batches and reconciles the processed counts against \
                  the counts declared in the header. Rejected lines and count mismatches are \
                  written to an error log."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Validate a file and load accepted records
    Ingest(IngestArgs),
    /// Validate and reconcile a file without loading anything
    Check(CheckArgs),
}

/// Arguments for the ingest command
#[derive(Debug, Clone, Parser)]
pub struct IngestArgs {
    /// ITAG file to ingest
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Postgres connection string
    ///
    /// Falls back to the DATABASE_URL environment variable.
    #[arg(
        long = "database-url",
        value_name = "URL",
        conflicts_with = "output_csv",
        help = "Postgres connection string (defaults to DATABASE_URL)"
    )]
    pub database_url: Option<String>,

    /// Append accepted records as COPY-ready CSV to a local file
    #[arg(
        long = "output-csv",
        value_name = "PATH",
        help = "Write accepted records to a CSV file instead of Postgres"
    )]
    pub output_csv: Option<PathBuf>,

    /// Target table
    #[arg(long = "table", value_name = "NAME", help = "Target table name")]
    pub table: Option<String>,

    /// Create the target table if it does not exist
    #[arg(long = "create-table", help = "Create the target table if missing")]
    pub create_table: bool,

    /// Records per committed batch
    #[arg(
        long = "batch-size",
        value_name = "COUNT",
        help = "Accepted records per committed batch"
    )]
    pub batch_size: Option<usize>,

    #[command(flatten)]
    pub validation: ValidationArgs,

    /// Error log destination
    #[arg(
        long = "error-log",
        value_name = "PATH",
        help = "File the error log is appended to"
    )]
    pub error_log: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the check command
#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    /// ITAG file to check
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub validation: ValidationArgs,

    /// Number of error log entries to print
    #[arg(
        long = "show",
        value_name = "COUNT",
        default_value_t = DEFAULT_SHOW_ENTRIES,
        help = "Error log entries to print (0 prints none)"
    )]
    pub show: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Validation tuning shared by both commands
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ValidationArgs {
    /// Number of validation workers
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        help = "Validation workers (1 validates inline)"
    )]
    pub workers: Option<usize>,

    /// Detail lines per validation chunk
    #[arg(
        long = "chunk-lines",
        value_name = "COUNT",
        help = "Detail lines handed to a worker at a time"
    )]
    pub chunk_lines: Option<usize>,
}

/// Verbosity and output format shared by both commands
#[derive(Debug, Clone, clap::Args)]
pub struct OutputArgs {
    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for the run report
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON run report for scripting
    Json,
}

impl OutputArgs {
    /// Get log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are shown for human output when not quiet
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}

impl ValidationArgs {
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers {
            if workers == 0 || workers > MAX_WORKERS {
                return Err(Error::configuration(format!(
                    "Workers must be between 1 and {}, got {}",
                    MAX_WORKERS, workers
                )));
            }
        }
        if self.chunk_lines == Some(0) {
            return Err(Error::configuration("Chunk lines must be greater than 0"));
        }
        Ok(())
    }
}

impl IngestArgs {
    /// Validate the ingest command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.file.is_file() {
            return Err(Error::input_not_found(&self.file));
        }
        if self.batch_size == Some(0) {
            return Err(Error::configuration("Batch size must be greater than 0"));
        }
        if let Some(output_csv) = &self.output_csv {
            if self.create_table {
                return Err(Error::configuration(
                    "--create-table only applies to the Postgres sink",
                ));
            }
            if let Some(parent) = output_csv.parent() {
                if !parent.as_os_str().is_empty() && !parent.is_dir() {
                    return Err(Error::configuration(format!(
                        "Output directory does not exist: {}",
                        parent.display()
                    )));
                }
            }
        }
        self.validation.validate()
    }
}

impl CheckArgs {
    /// Validate the check command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.file.is_file() {
            return Err(Error::input_not_found(&self.file));
        }
        self.validation.validate()
    }
}
