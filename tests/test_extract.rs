//! Tests for table extraction through a RowSource

use churnflow::config::DEFAULT_BATCH_SIZE;
use churnflow::pipeline::*;
use churnflow::ChurnError;
use polars::prelude::*;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_extract_preserves_rows_across_batch_boundaries() {
    // 2500 rows with batch size 1000 -> 1000, 1000, 500
    let source_df = create_churn_dataframe(1500, 1000);
    let mut source = MemorySource::default().with_table("stg_Churn", source_df.clone());
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("data").join("fetched_data.csv");

    let report = extract_table(&mut source, "stg_Churn", &output, DEFAULT_BATCH_SIZE).unwrap();

    assert_eq!(source.batch_sizes, vec![1000, 1000, 500]);
    assert_eq!(report.rows, 2500);
    assert_eq!(report.batches, 3);
    assert_eq!(report.columns, 4);
    assert!(report.file_size >= 1024);

    let written = load_dataframe(&output).unwrap();
    assert_shape(&written, 2500, 4);

    // Arrival order is kept
    let statuses: Vec<Option<&str>> = written
        .column("Customer_Status")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    let expected: Vec<Option<&str>> = source_df
        .column("Customer_Status")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(statuses, expected);
}

#[test]
fn test_extract_single_partial_batch() {
    let mut source = MemorySource::default().with_table("stg_Churn", create_churn_dataframe(60, 40));
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("fetched_data.csv");

    let report = extract_table(&mut source, "stg_Churn", &output, 1000).unwrap();

    assert_eq!(report.rows, 100);
    assert_eq!(report.batches, 1);
}

#[test]
fn test_extract_missing_table() {
    let mut source = MemorySource::default().with_table("stg_Churn", create_churn_dataframe(60, 40));
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("fetched_data.csv");

    // Table names are case-sensitive
    let err = extract_table(&mut source, "STG_CHURN", &output, 1000).unwrap_err();

    assert!(matches!(err, ChurnError::TableNotFound(ref t) if t == "STG_CHURN"));
    assert!(!output.exists(), "Nothing should be written for a missing table");
}

#[test]
fn test_extract_empty_table() {
    let empty = create_churn_dataframe(60, 40).head(Some(0));
    let mut source = MemorySource::default().with_table("stg_Churn", empty);
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("fetched_data.csv");

    let err = extract_table(&mut source, "stg_Churn", &output, 1000).unwrap_err();

    assert!(matches!(err, ChurnError::EmptyTable(_)));
    assert!(!output.exists());
}

#[test]
fn test_extract_undersized_output() {
    let tiny = df! {
        "id" => [1i64, 2],
        "Customer_Status" => ["Stayed", "Churned"],
    }
    .unwrap();
    let mut source = MemorySource::default().with_table("tiny", tiny);
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("fetched_data.csv");

    let err = extract_table(&mut source, "tiny", &output, 1000).unwrap_err();

    match err {
        ChurnError::UndersizedOutput { size, minimum } => {
            assert!(size < 1024);
            assert_eq!(minimum, 1024);
        }
        other => panic!("expected UndersizedOutput, got {:?}", other),
    }
}

#[test]
fn test_extract_parquet_output() {
    let mut source = MemorySource::default().with_table("stg_Churn", create_churn_dataframe(600, 400));
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("fetched_data.parquet");

    let report = extract_table(&mut source, "stg_Churn", &output, 250).unwrap();

    assert_eq!(report.batches, 4);
    let written = load_dataframe(&output).unwrap();
    assert_eq!(written.height(), 1000);
}

#[test]
fn test_extract_rejects_zero_batch_size() {
    let mut source = MemorySource::default().with_table("stg_Churn", create_churn_dataframe(60, 40));
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("fetched_data.csv");

    assert!(extract_table(&mut source, "stg_Churn", &output, 0).is_err());
}
