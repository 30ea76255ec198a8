//! End-to-end tests for ITAG ingestion
//!
//! Drive the public pipeline API against temporary files, covering the
//! header reconciliation scenarios, batching, both bundled file outputs and
//! error log persistence.

mod common;

use common::{MemorySink, detail_line, fixed_processed_at, header_line, write_itag_file};
use itag_ingest::app::services::reconciler::Dimension;
use itag_ingest::{
    CsvFileSink, Error, IngestConfig, IngestPipeline, IssueKind, LineId, PostgresSink,
    SinkTarget, TagStatus,
};
use tempfile::TempDir;

fn pipeline(batch_size: usize, workers: usize) -> IngestPipeline {
    let config = IngestConfig::default()
        .with_batch_size(batch_size)
        .with_workers(workers)
        .with_chunk_lines(4);
    IngestPipeline::new(config).with_processed_at(fixed_processed_at())
}

#[tokio::test]
async fn test_declared_counts_disagree_with_records() {
    let file = write_itag_file(&[
        header_line(3, [1, 1, 1, 1]),
        detail_line(1, 1),
        detail_line(2, 2),
    ]);
    let sink = MemorySink::default();

    let outcome = pipeline(100, 1)
        .run_path(file.path(), sink.clone())
        .await
        .unwrap();

    assert_eq!(outcome.report.summary.actual_record_count, 2);
    assert_eq!(outcome.report.findings.len(), 3);
    assert_eq!(outcome.report.findings[0].dimension, Dimension::RecordCount);
    assert_eq!(outcome.report.findings[0].expected, 3);
    assert_eq!(outcome.report.findings[0].actual, 2);
    assert_eq!(
        outcome.error_log.count_of(IssueKind::ReconciliationMismatch),
        3
    );
    assert_eq!(sink.row_count(), 2);
}

#[tokio::test]
async fn test_batches_of_two_with_partial_final_flush() {
    let mut lines = vec![header_line(5, [5, 0, 0, 0])];
    lines.extend((0..5).map(|n| detail_line(n, 1)));
    let file = write_itag_file(&lines);
    let sink = MemorySink::default();

    let outcome = pipeline(2, 1)
        .run_path(file.path(), sink.clone())
        .await
        .unwrap();

    assert_eq!(sink.batch_sizes(), vec![2, 2, 1]);
    assert_eq!(outcome.report.batch_sizes, vec![2, 2, 1]);
    assert_eq!(outcome.report.rows_committed, 5);
    assert!(outcome.error_log.is_empty());
}

#[tokio::test]
async fn test_multiple_violations_are_reported_together() {
    let file = write_itag_file(&[
        header_line(1, [1, 0, 0, 0]),
        "A0100000000000019".to_string(),
        detail_line(1, 1),
    ]);

    let outcome = pipeline(100, 2)
        .run_path(file.path(), MemorySink::default())
        .await
        .unwrap();

    let entries = outcome.error_log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].line, LineId::Line(2));
    assert!(entries[0].reason.contains("TAG_AGENCY_ID not numeric: A01"));
    assert!(entries[0].reason.contains("Invalid TAG_STATUS: 9"));
    assert!(entries[0].reason.contains("; "));
    assert_eq!(outcome.report.summary.actual_status_counts[TagStatus::Valid], 1);
    assert!(outcome.report.is_reconciled());
}

#[tokio::test]
async fn test_parallel_and_sequential_runs_agree() {
    let mut lines = vec![header_line(0, [0; 4])];
    for n in 0..103u64 {
        if n % 10 == 3 {
            lines.push(format!("001{:013}", n));
        } else {
            lines.push(detail_line(n, (n % 4) as u8 + 1));
        }
    }
    let file = write_itag_file(&lines);
    let sequential_sink = MemorySink::default();
    let parallel_sink = MemorySink::default();

    let sequential = pipeline(10, 1)
        .run_path(file.path(), sequential_sink.clone())
        .await
        .unwrap();
    let parallel = pipeline(10, 4)
        .run_path(file.path(), parallel_sink.clone())
        .await
        .unwrap();

    assert_eq!(sequential.report.summary, parallel.report.summary);
    assert_eq!(sequential.error_log.render(), parallel.error_log.render());
    assert_eq!(
        *sequential_sink.batches.lock().unwrap(),
        *parallel_sink.batches.lock().unwrap()
    );
    assert_eq!(sequential.report.rejected_lines, 10);
}

#[tokio::test]
async fn test_sink_failure_is_fatal() {
    let mut lines = vec![header_line(6, [6, 0, 0, 0])];
    lines.extend((0..6).map(|n| detail_line(n, 1)));
    let file = write_itag_file(&lines);
    let sink = MemorySink {
        fail_on_sequence: Some(2),
        ..MemorySink::default()
    };

    let error = pipeline(2, 1)
        .run_path(file.path(), sink.clone())
        .await
        .unwrap_err();

    assert!(matches!(error, Error::SinkFlush { sequence: 2, .. }));
    assert_eq!(sink.batch_sizes(), vec![2]);
}

#[tokio::test]
async fn test_csv_output_and_error_log_files() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("accepted.csv");
    let log_path = temp_dir.path().join("ingestion_error.log");

    let file = write_itag_file(&[
        header_line(2, [1, 0, 0, 1]),
        detail_line(10, 1),
        "0011234567".to_string(),
        detail_line(11, 4),
    ]);

    let sink = CsvFileSink::open(&output_path).await.unwrap();
    let outcome = pipeline(100, 1).run_path(file.path(), sink).await.unwrap();
    let written = outcome.error_log.persist(&log_path).await.unwrap();

    let accepted = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(
        accepted,
        "001,0000000000010,1,2025-01-01 09:00:00.000000\n\
         001,0000000000011,4,2025-01-01 09:00:00.000000\n"
    );

    assert_eq!(written, 1);
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(
        log,
        "Line 3: line too short: 10 | Content: 0011234567\n"
    );
}

#[tokio::test]
async fn test_error_log_is_appended_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("ingestion_error.log");
    let file = write_itag_file(&[header_line(1, [0; 4])]);

    for _ in 0..2 {
        let outcome = pipeline(100, 1)
            .run_path(file.path(), MemorySink::default())
            .await
            .unwrap();
        outcome.error_log.persist(&log_path).await.unwrap();
    }

    let log = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| line.starts_with("Line END: RECORD_COUNT mismatch")));
}

#[tokio::test]
async fn test_clean_run_writes_no_error_log() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("ingestion_error.log");
    let file = write_itag_file(&[header_line(1, [0, 1, 0, 0]), detail_line(1, 2)]);

    let outcome = pipeline(100, 1)
        .run_path(file.path(), MemorySink::default())
        .await
        .unwrap();

    assert_eq!(outcome.error_log.persist(&log_path).await.unwrap(), 0);
    assert!(!log_path.exists());
}

/// Loads into a real database when ITAG_TEST_DATABASE_URL is set
#[tokio::test]
async fn test_postgres_round_trip() {
    let Ok(url) = std::env::var("ITAG_TEST_DATABASE_URL") else {
        println!("Skipping Postgres test - ITAG_TEST_DATABASE_URL not set");
        return;
    };

    let table = format!("itag_test_{}", std::process::id());
    let mut sink = PostgresSink::connect(&url, SinkTarget::new(&table))
        .await
        .expect("Failed to connect to test database");
    sink.ensure_table().await.unwrap();

    let mut lines = vec![header_line(3, [1, 1, 1, 0])];
    lines.extend((1..=3).map(|n| detail_line(n, n as u8)));
    let file = write_itag_file(&lines);

    let outcome = pipeline(2, 1).run_path(file.path(), sink).await.unwrap();

    assert_eq!(outcome.report.rows_committed, 3);
    assert!(outcome.error_log.is_empty());
}
