//! Tests for the buffering sink adapter

use super::super::adapter::BatchSinkAdapter;
use super::{RecordingSink, test_processed_at, test_record};
use crate::models::TagStatus;

#[tokio::test]
async fn test_full_batches_then_partial_final_flush() {
    let (sink, recorded) = RecordingSink::new();
    let mut adapter = BatchSinkAdapter::new(sink, 2, test_processed_at());

    for n in 0..5 {
        adapter.push(test_record(n, TagStatus::Valid)).await.unwrap();
    }
    assert_eq!(adapter.pending(), 1);

    let stats = adapter.finish().await.unwrap();

    assert_eq!(recorded.batch_sizes(), vec![2, 2, 1]);
    assert_eq!(stats.batch_sizes, vec![2, 2, 1]);
    assert_eq!(stats.rows_committed, 5);
    assert!(recorded.is_closed());
}

#[tokio::test]
async fn test_no_records_still_performs_final_flush() {
    let (sink, recorded) = RecordingSink::new();
    let adapter = BatchSinkAdapter::new(sink, 100, test_processed_at());

    let stats = adapter.finish().await.unwrap();

    assert_eq!(recorded.batch_sizes(), vec![0]);
    assert_eq!(stats.flushes(), 1);
    assert_eq!(stats.rows_committed, 0);
    assert!(recorded.is_closed());
}

#[tokio::test]
async fn test_exact_multiple_ends_with_empty_final_flush() {
    let (sink, recorded) = RecordingSink::new();
    let mut adapter = BatchSinkAdapter::new(sink, 2, test_processed_at());

    for n in 0..4 {
        adapter.push(test_record(n, TagStatus::Invalid)).await.unwrap();
    }
    let stats = adapter.finish().await.unwrap();

    assert_eq!(recorded.batch_sizes(), vec![2, 2, 0]);
    assert_eq!(stats.rows_committed, 4);
}

#[tokio::test]
async fn test_rows_keep_input_order() {
    let (sink, recorded) = RecordingSink::new();
    let mut adapter = BatchSinkAdapter::new(sink, 3, test_processed_at());

    for n in 0..7 {
        adapter.push(test_record(n, TagStatus::LowBalance)).await.unwrap();
    }
    adapter.finish().await.unwrap();

    let serials: Vec<String> = recorded
        .rows()
        .into_iter()
        .map(|row| row.tag_serial_number)
        .collect();
    let expected: Vec<String> = (0..7).map(|n| format!("{:013}", n)).collect();
    assert_eq!(serials, expected);
}

#[tokio::test]
async fn test_flush_failure_is_propagated() {
    let (sink, recorded) = RecordingSink::failing_on(2);
    let mut adapter = BatchSinkAdapter::new(sink, 2, test_processed_at());

    adapter.push(test_record(0, TagStatus::Valid)).await.unwrap();
    adapter.push(test_record(1, TagStatus::Valid)).await.unwrap();
    adapter.push(test_record(2, TagStatus::Valid)).await.unwrap();
    let error = adapter
        .push(test_record(3, TagStatus::Valid))
        .await
        .unwrap_err();

    assert!(error.is_sink_failure());
    assert!(error.to_string().contains("batch 2"));
    assert_eq!(recorded.batch_sizes(), vec![2]);
    assert!(!recorded.is_closed());
}

#[tokio::test]
async fn test_final_flush_failure_is_propagated() {
    let (sink, recorded) = RecordingSink::failing_on(1);
    let mut adapter = BatchSinkAdapter::new(sink, 10, test_processed_at());

    adapter.push(test_record(0, TagStatus::Valid)).await.unwrap();
    let result = adapter.finish().await;

    assert!(result.is_err());
    assert!(recorded.batch_sizes().is_empty());
    assert!(!recorded.is_closed());
}
