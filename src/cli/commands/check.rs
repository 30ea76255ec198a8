//! Check command implementation
//!
//! Runs the full validation and reconciliation pass with a discarding sink.
//! Nothing is loaded and no error log file is written; the first entries are
//! printed instead.

use tracing::info;

use super::shared::{
    CommandStatus, create_progress_bar, load_configuration, print_report, setup_logging,
};
use crate::app::services::batch::DiscardSink;
use crate::app::services::pipeline::IngestPipeline;
use crate::cli::args::CheckArgs;

/// Run the check command
///
/// Returns [`CommandStatus::IssuesFound`] when the error log is not empty.
pub async fn run_check(args: CheckArgs) -> anyhow::Result<CommandStatus> {
    setup_logging(&args.output)?;
    args.validate()?;

    let config = load_configuration(&args.validation)?;
    info!(
        "Checking {} with {} worker(s)",
        args.file.display(),
        config.workers
    );

    let mut pipeline = IngestPipeline::new(config);
    if args.output.show_progress() {
        pipeline = pipeline.with_progress(create_progress_bar(0, "Checking records"));
    }

    let outcome = pipeline.run_path(&args.file, DiscardSink::new()).await?;

    let shown = args.show.min(outcome.error_log.len());
    print_report(
        &outcome.report,
        args.output.output_format,
        None,
        &outcome.error_log.entries()[..shown],
    )?;

    if outcome.error_log.is_empty() {
        Ok(CommandStatus::Success)
    } else {
        Ok(CommandStatus::IssuesFound)
    }
}
