//! Shared components for CLI commands
//!
//! Logging setup, layered configuration, progress bars and report printing
//! used by both the ingest and check commands.

use anyhow::Context;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::app::services::error_log::LogEntry;
use crate::app::services::pipeline::RunReport;
use crate::cli::args::{IngestArgs, OutputArgs, OutputFormat, ValidationArgs};
use crate::config::IngestConfig;
use crate::constants::EXIT_ISSUES_FOUND;
use crate::{Error, Result};

/// How a command finished, mapped to the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// The run completed but the error log is not empty
    IssuesFound,
}

impl CommandStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::IssuesFound => EXIT_ISSUES_FOUND,
        }
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(output: &OutputArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = output.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("itag_ingest={}", log_level)));

    let installed = if output.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    installed.map_err(|e| Error::configuration(format!("Failed to initialise logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (defaults -> env -> args)
pub fn load_configuration(validation: &ValidationArgs) -> Result<IngestConfig> {
    let mut config = IngestConfig::from_env()?;
    apply_validation_overrides(&mut config, validation);
    config.validate()?;
    Ok(config)
}

/// Configuration for the ingest command, including sink settings
pub fn load_ingest_configuration(args: &IngestArgs) -> Result<IngestConfig> {
    let mut config = IngestConfig::from_env()?;
    apply_validation_overrides(&mut config, &args.validation);
    apply_cli_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

fn apply_validation_overrides(config: &mut IngestConfig, validation: &ValidationArgs) {
    if let Some(workers) = validation.workers {
        config.workers = workers;
    }
    if let Some(chunk_lines) = validation.chunk_lines {
        config.chunk_lines = chunk_lines;
    }
}

/// Apply ingest CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut IngestConfig, args: &IngestArgs) {
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(table) = &args.table {
        config.target_table = table.clone();
    }
    if let Some(error_log) = &args.error_log {
        config.error_log_path = error_log.clone();
    }
    if let Some(url) = &args.database_url {
        config.database_url = Some(url.clone());
    }
}

/// Create a byte-based progress bar with appropriate styling
pub fn create_progress_bar(total_bytes: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg} [{bytes_per_sec}] ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// JSON document printed with `--output-format json`
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a RunReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_log: Option<&'a Path>,
    #[serde(skip_serializing_if = "no_entries")]
    entries: &'a [LogEntry],
}

fn no_entries(entries: &&[LogEntry]) -> bool {
    entries.is_empty()
}

/// Print the run report in the requested format
///
/// `entries` are echoed after the summary (human) or embedded (JSON).
pub fn print_report(
    report: &RunReport,
    format: OutputFormat,
    error_log: Option<&Path>,
    entries: &[LogEntry],
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let document = JsonReport {
                report,
                error_log,
                entries,
            };
            let json = serde_json::to_string_pretty(&document)
                .context("Failed to serialize run report")?;
            println!("{}", json);
        }
        OutputFormat::Human => print_human_report(report, error_log, entries),
    }
    Ok(())
}

fn print_human_report(report: &RunReport, error_log: Option<&Path>, entries: &[LogEntry]) {
    println!(
        "\n{} Records processed: {}, Errors: {}",
        "ITAG ingestion complete.".bright_green().bold(),
        report.records_processed().to_string().bright_white().bold(),
        if report.error_count > 0 {
            report.error_count.to_string().bright_red().bold()
        } else {
            report.error_count.to_string().bright_white().bold()
        }
    );

    let header_state = if report.header_valid {
        "valid".bright_green()
    } else {
        "invalid".bright_red()
    };
    println!("  {} {}", "Header:".bright_cyan(), header_state);
    println!(
        "  {} {} ({})",
        "Lines read:".bright_cyan(),
        report.lines_read.to_string().bright_white(),
        format_size(report.bytes_read)
    );
    if report.rejected_lines > 0 {
        println!(
            "  {} {}",
            "Rejected lines:".bright_red(),
            report.rejected_lines.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {} rows in {} batch(es)",
        "Committed:".bright_cyan(),
        report.rows_committed.to_string().bright_white(),
        report.batch_sizes.iter().filter(|size| **size > 0).count()
    );

    if report.findings.is_empty() {
        println!(
            "  {} {}",
            "Reconciliation:".bright_cyan(),
            "counts match header".bright_green()
        );
    } else {
        println!("  {}", "Reconciliation mismatches:".bright_yellow());
        for finding in &report.findings {
            println!("    {}", finding.to_string().yellow());
        }
    }

    if let Some(path) = error_log {
        if report.error_count > 0 {
            println!(
                "  {} {}",
                "Error log:".bright_cyan(),
                path.display().to_string().bright_white()
            );
        }
    }

    if !entries.is_empty() {
        println!("\n{}", "Error log entries".bright_yellow().bold());
        for entry in entries {
            println!("  {}", entry);
        }
        if entries.len() < report.error_count {
            println!("  ... and {} more", report.error_count - entries.len());
        }
    }

    println!(
        "{} {:.2} seconds",
        "Total runtime:".bright_cyan(),
        report.elapsed_secs
    );
}
