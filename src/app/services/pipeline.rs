//! Run driver for one ITAG file
//!
//! Reads the header, streams detail lines through the record parser in file
//! order, routes each outcome to the accumulator and batch adapter or to the
//! error log, then reconciles the totals against the header.
//!
//! With more than one worker, detail lines are validated in chunks on blocking
//! worker threads. At most `workers` chunks are in flight and results are
//! consumed in submission order, so the accepted stream is identical to a
//! sequential run.

use chrono::{Local, NaiveDateTime};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::accumulator::Accumulator;
use super::batch::{BatchSink, BatchSinkAdapter, SinkStats};
use super::error_log::ErrorLog;
use super::header_parser::{HeaderOutcome, parse_header};
use super::reconciler::{ReconciliationFinding, reconcile};
use super::record_parser::parse_chunk;
use crate::config::IngestConfig;
use crate::constants::{LINE_BUFFER_CAPACITY, PROCESSED_AT_FORMAT};
use crate::models::{HeaderRecord, RunSummary, ValidationOutcome};
use crate::{Error, Result};

type Chunk = Vec<(u64, Vec<u8>)>;

/// Serializable summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub header: HeaderRecord,
    pub header_valid: bool,
    pub summary: RunSummary,
    pub findings: Vec<ReconciliationFinding>,
    pub rejected_lines: u64,
    /// Entries in the error log: header issues, rejections and findings
    pub error_count: usize,
    pub batch_sizes: Vec<usize>,
    pub rows_committed: u64,
    pub lines_read: u64,
    pub bytes_read: u64,
    pub processed_at: String,
    pub elapsed_secs: f64,
}

impl RunReport {
    /// Accepted records, as shown in the completion summary
    pub fn records_processed(&self) -> u64 {
        self.summary.actual_record_count
    }

    pub fn is_reconciled(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub report: RunReport,
    pub error_log: ErrorLog,
}

/// Per-run state fed by the line router
struct RunState<S: BatchSink> {
    accumulator: Accumulator,
    adapter: BatchSinkAdapter<S>,
    log: ErrorLog,
    rejected: u64,
}

impl<S: BatchSink> RunState<S> {
    async fn route(&mut self, outcome: ValidationOutcome) -> Result<()> {
        match outcome {
            ValidationOutcome::Accepted(record) => {
                self.accumulator.record(&record);
                self.adapter.push(record).await?;
            }
            rejected @ ValidationOutcome::Rejected { .. } => {
                self.rejected += 1;
                self.log.append_rejection(&rejected);
            }
        }
        Ok(())
    }

    async fn route_all(&mut self, outcomes: Vec<ValidationOutcome>) -> Result<()> {
        for outcome in outcomes {
            self.route(outcome).await?;
        }
        Ok(())
    }
}

/// Line and byte counters for the input
#[derive(Debug, Default)]
struct ReadCounters {
    lines: u64,
    bytes: u64,
}

/// Drives one ingestion run
pub struct IngestPipeline {
    config: IngestConfig,
    processed_at: NaiveDateTime,
    progress: Option<ProgressBar>,
}

impl IngestPipeline {
    /// Create a pipeline, capturing the run-wide ingestion timestamp
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            processed_at: Local::now().naive_local(),
            progress: None,
        }
    }

    /// Override the ingestion timestamp
    pub fn with_processed_at(mut self, processed_at: NaiveDateTime) -> Self {
        self.processed_at = processed_at;
        self
    }

    /// Report bytes read to `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Open `path` and run it through the pipeline
    pub async fn run_path<S: BatchSink>(&self, path: &Path, sink: S) -> Result<IngestOutcome> {
        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::input_not_found(path));
            }
            Err(e) => {
                return Err(Error::io(format!("Failed to open {}", path.display()), e));
            }
        };

        if let Some(progress) = &self.progress {
            if let Ok(metadata) = file.metadata().await {
                progress.set_length(metadata.len());
            }
        }

        info!("Ingesting {}", path.display());
        self.run(BufReader::with_capacity(1 << 20, file), sink).await
    }

    /// Process a whole input stream, header first
    ///
    /// Data-quality problems end up in the returned error log. Only an invalid
    /// configuration, input I/O failures, sink failures and worker failures
    /// abort the run.
    pub async fn run<R, S>(&self, mut reader: R, sink: S) -> Result<IngestOutcome>
    where
        R: AsyncBufRead + Unpin,
        S: BatchSink,
    {
        self.config.validate()?;

        let start = Instant::now();
        let mut counters = ReadCounters::default();

        let header_line = read_line(&mut reader, &mut counters)
            .await?
            .unwrap_or_default();
        if let Some(progress) = &self.progress {
            progress.inc(counters.bytes);
        }
        let header = parse_header(&header_line);

        let mut log = ErrorLog::new();
        log.append_header(&header);

        let mut state = RunState {
            accumulator: Accumulator::new(),
            adapter: BatchSinkAdapter::new(sink, self.config.batch_size, self.processed_at),
            log,
            rejected: 0,
        };

        if self.config.is_parallel() {
            self.validate_parallel(&mut reader, &mut counters, &mut state)
                .await?;
        } else {
            self.validate_inline(&mut reader, &mut counters, &mut state)
                .await?;
        }

        let RunState {
            accumulator,
            adapter,
            mut log,
            rejected,
        } = state;

        let sink_stats = adapter.finish().await?;
        let summary = accumulator.snapshot();
        let findings = reconcile(&header.header, &summary);
        log.append_findings(&findings);

        if let Some(progress) = &self.progress {
            progress.finish_with_message(format!(
                "{} records accepted, {} rejected",
                summary.actual_record_count, rejected
            ));
        }

        let report = self.build_report(
            header,
            summary,
            findings,
            rejected,
            &log,
            sink_stats,
            counters,
            start,
        );
        info!(
            "Run complete: {} accepted, {} rejected, {} log entries in {:.2}s",
            report.records_processed(),
            report.rejected_lines,
            report.error_count,
            report.elapsed_secs
        );

        Ok(IngestOutcome {
            report,
            error_log: log,
        })
    }

    async fn validate_inline<R, S>(
        &self,
        reader: &mut R,
        counters: &mut ReadCounters,
        state: &mut RunState<S>,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        S: BatchSink,
    {
        loop {
            let chunk = self.read_chunk(reader, counters).await?;
            if chunk.is_empty() {
                return Ok(());
            }
            state.route_all(parse_chunk(&chunk)).await?;
        }
    }

    async fn validate_parallel<R, S>(
        &self,
        reader: &mut R,
        counters: &mut ReadCounters,
        state: &mut RunState<S>,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        S: BatchSink,
    {
        let workers = self.config.workers;
        let mut in_flight: VecDeque<JoinHandle<Vec<ValidationOutcome>>> =
            VecDeque::with_capacity(workers);

        debug!(
            "Validating in chunks of {} lines on {} workers",
            self.config.chunk_lines, workers
        );

        loop {
            let chunk = self.read_chunk(reader, counters).await?;
            if chunk.is_empty() {
                break;
            }

            if in_flight.len() >= workers {
                if let Some(oldest) = in_flight.pop_front() {
                    state.route_all(oldest.await?).await?;
                }
            }
            in_flight.push_back(tokio::task::spawn_blocking(move || parse_chunk(&chunk)));
        }

        while let Some(handle) = in_flight.pop_front() {
            state.route_all(handle.await?).await?;
        }
        Ok(())
    }

    /// Read up to `chunk_lines` detail lines; empty at end of input
    async fn read_chunk<R>(&self, reader: &mut R, counters: &mut ReadCounters) -> Result<Chunk>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut chunk = Vec::with_capacity(self.config.chunk_lines.min(1 << 16));
        let bytes_before = counters.bytes;

        while chunk.len() < self.config.chunk_lines {
            match read_line(reader, counters).await? {
                Some(line) => chunk.push((counters.lines, line)),
                None => break,
            }
        }

        if let Some(progress) = &self.progress {
            progress.inc(counters.bytes - bytes_before);
        }
        Ok(chunk)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_report(
        &self,
        header: HeaderOutcome,
        summary: RunSummary,
        findings: Vec<ReconciliationFinding>,
        rejected: u64,
        log: &ErrorLog,
        sink_stats: SinkStats,
        counters: ReadCounters,
        start: Instant,
    ) -> RunReport {
        RunReport {
            header: header.header,
            header_valid: header.valid,
            summary,
            findings,
            rejected_lines: rejected,
            error_count: log.len(),
            batch_sizes: sink_stats.batch_sizes,
            rows_committed: sink_stats.rows_committed,
            lines_read: counters.lines,
            bytes_read: counters.bytes,
            processed_at: self.processed_at.format(PROCESSED_AT_FORMAT).to_string(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        }
    }
}

/// Next line without its terminator, `None` at end of input
///
/// `\n`, `\r\n` and a lone `\r` all end a line.
async fn read_line<R>(reader: &mut R, counters: &mut ReadCounters) -> Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::with_capacity(LINE_BUFFER_CAPACITY);
    let mut read = 0usize;
    let mut after_cr = false;

    loop {
        let available = reader.fill_buf().await.map_err(|e| {
            Error::io(
                format!("Failed to read input at line {}", counters.lines + 1),
                e,
            )
        })?;
        if available.is_empty() {
            break;
        }

        if after_cr {
            if available[0] == b'\n' {
                reader.consume(1);
                read += 1;
            }
            break;
        }

        match available.iter().position(|b| matches!(b, b'\n' | b'\r')) {
            Some(end) => {
                let terminator = available[end];
                line.extend_from_slice(&available[..end]);
                reader.consume(end + 1);
                read += end + 1;
                if terminator == b'\n' {
                    break;
                }
                after_cr = true;
            }
            None => {
                let len = available.len();
                line.extend_from_slice(available);
                reader.consume(len);
                read += len;
            }
        }
    }

    if read == 0 {
        return Ok(None);
    }

    counters.lines += 1;
    counters.bytes += read as u64;
    Ok(Some(line))
}
