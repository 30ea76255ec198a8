//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then `ITAG_*` environment
//! variables, then command-line overrides applied by the CLI.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_LINES, DEFAULT_ERROR_LOG, DEFAULT_TARGET_TABLE, MAX_WORKERS,
};
use crate::{Error, Result};

/// Environment variable names read by [`IngestConfig::from_env`]
pub mod env_vars {
    pub const BATCH_SIZE: &str = "ITAG_BATCH_SIZE";
    pub const WORKERS: &str = "ITAG_WORKERS";
    pub const CHUNK_LINES: &str = "ITAG_CHUNK_LINES";
    pub const ERROR_LOG: &str = "ITAG_ERROR_LOG";
    pub const TABLE: &str = "ITAG_TABLE";
    pub const DATABASE_URL: &str = "DATABASE_URL";
}

/// Settings for one ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Accepted records per sink flush
    pub batch_size: usize,

    /// Validation workers; 1 validates inline
    pub workers: usize,

    /// Detail lines handed to a worker at a time
    pub chunk_lines: usize,

    /// Where the error log is appended after the run
    pub error_log_path: PathBuf,

    /// Target table, optionally schema-qualified
    pub target_table: String,

    /// Postgres connection string
    #[serde(skip_serializing)]
    pub database_url: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            workers: num_cpus::get().clamp(1, MAX_WORKERS),
            chunk_lines: DEFAULT_CHUNK_LINES,
            error_log_path: PathBuf::from(DEFAULT_ERROR_LOG),
            target_table: DEFAULT_TARGET_TABLE.to_string(),
            database_url: None,
        }
    }
}

impl IngestConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(env_vars::BATCH_SIZE) {
            config.batch_size = parse_var(env_vars::BATCH_SIZE, &value)?;
        }
        if let Some(value) = lookup(env_vars::WORKERS) {
            config.workers = parse_var(env_vars::WORKERS, &value)?;
        }
        if let Some(value) = lookup(env_vars::CHUNK_LINES) {
            config.chunk_lines = parse_var(env_vars::CHUNK_LINES, &value)?;
        }
        if let Some(value) = lookup(env_vars::ERROR_LOG) {
            config.error_log_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(env_vars::TABLE) {
            config.target_table = value;
        }
        if let Some(value) = lookup(env_vars::DATABASE_URL) {
            if !value.trim().is_empty() {
                config.database_url = Some(value);
            }
        }

        debug!(
            "Loaded configuration: batch_size={}, workers={}, chunk_lines={}, table={}",
            config.batch_size, config.workers, config.chunk_lines, config.target_table
        );
        Ok(config)
    }

    /// Set the sink flush threshold
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the number of validation workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_chunk_lines(mut self, chunk_lines: usize) -> Self {
        self.chunk_lines = chunk_lines;
        self
    }

    pub fn with_error_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_log_path = path.into();
        self
    }

    pub fn with_target_table(mut self, table: impl Into<String>) -> Self {
        self.target_table = table.into();
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Whether validation runs on worker threads
    pub fn is_parallel(&self) -> bool {
        self.workers > 1
    }

    /// Check every setting, reporting the first invalid one
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::configuration("batch size must be greater than 0"));
        }
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(Error::configuration(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.workers
            )));
        }
        if self.chunk_lines == 0 {
            return Err(Error::configuration("chunk lines must be greater than 0"));
        }
        if !is_table_name(&self.target_table) {
            return Err(Error::configuration(format!(
                "invalid table name: {:?}",
                self.target_table
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::configuration(format!("{} is not a valid number: {:?}", name, value)))
}

/// `name` or `schema.name`, each part a plain SQL identifier
fn is_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2 && parts.iter().all(|part| is_identifier(part))
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    part.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
