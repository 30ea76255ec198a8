//! Ingest command implementation
//!
//! Validates one ITAG file, loads accepted records through the selected sink
//! and appends the error log once the run has completed.

use anyhow::Context;
use colored::*;
use std::path::Path;
use tracing::{info, warn};

use super::shared::{
    CommandStatus, create_progress_bar, load_ingest_configuration, print_report, setup_logging,
};
use crate::Error;
use crate::app::services::batch::{CsvFileSink, PostgresSink, SinkTarget};
use crate::app::services::pipeline::{IngestOutcome, IngestPipeline};
use crate::cli::args::{IngestArgs, OutputFormat};
use crate::config::IngestConfig;

/// Run the ingest command
pub async fn run_ingest(args: IngestArgs) -> anyhow::Result<CommandStatus> {
    setup_logging(&args.output)?;
    args.validate()?;

    let config = load_ingest_configuration(&args)?;
    info!(
        "Ingesting {} (batch size {}, {} worker(s))",
        args.file.display(),
        config.batch_size,
        config.workers
    );

    if args.output.output_format == OutputFormat::Human && !args.output.quiet {
        println!(
            "{} {}",
            "Ingesting".bright_yellow(),
            args.file.display().to_string().bright_white()
        );
    }

    let error_log_path = config.error_log_path.clone();
    let outcome = match &args.output_csv {
        Some(path) => ingest_to_csv(config, &args, path).await?,
        None => ingest_to_postgres(config, &args).await?,
    };

    let written = outcome
        .error_log
        .persist(&error_log_path)
        .await
        .context("Run completed but the error log could not be written")?;
    if written > 0 {
        warn!(
            "{} issue(s) recorded in {}",
            written,
            error_log_path.display()
        );
    }

    if !args.output.quiet || args.output.output_format == OutputFormat::Json {
        print_report(
            &outcome.report,
            args.output.output_format,
            Some(&error_log_path),
            &[],
        )?;
    }

    Ok(CommandStatus::Success)
}

fn pipeline_for(config: IngestConfig, args: &IngestArgs) -> IngestPipeline {
    let pipeline = IngestPipeline::new(config);
    if args.output.show_progress() {
        pipeline.with_progress(create_progress_bar(0, "Validating records"))
    } else {
        pipeline
    }
}

async fn ingest_to_csv(
    config: IngestConfig,
    args: &IngestArgs,
    path: &Path,
) -> anyhow::Result<IngestOutcome> {
    let sink = CsvFileSink::open(path).await?;
    let outcome = pipeline_for(config, args).run_path(&args.file, sink).await?;
    Ok(outcome)
}

async fn ingest_to_postgres(
    config: IngestConfig,
    args: &IngestArgs,
) -> anyhow::Result<IngestOutcome> {
    let Some(url) = config.database_url.clone() else {
        return Err(Error::configuration(
            "No sink configured: pass --database-url, set DATABASE_URL or use --output-csv",
        )
        .into());
    };

    let mut sink = PostgresSink::connect(&url, SinkTarget::new(&config.target_table)).await?;
    if args.create_table {
        sink.ensure_table().await?;
    }

    let outcome = pipeline_for(config, args).run_path(&args.file, sink).await?;
    Ok(outcome)
}
