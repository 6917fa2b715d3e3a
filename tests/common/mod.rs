//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use churnflow::config::{ForestConfig, TrainConfig};
use churnflow::pipeline::{BatchSink, RowSource};
use churnflow::{ChurnError, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// Customer table with separable classes.
///
/// Stayed customers have long tenure and moderate charges, churned customers
/// short tenure and high charges. Values are jittered with a fixed seed.
/// Columns: `Tenure_in_Months`, `Monthly_Charge`, `Total_Revenue`,
/// `Customer_Status`.
pub fn create_churn_dataframe(stayed: usize, churned: usize) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tenure = Vec::with_capacity(stayed + churned);
    let mut monthly = Vec::with_capacity(stayed + churned);
    let mut revenue = Vec::with_capacity(stayed + churned);
    let mut status = Vec::with_capacity(stayed + churned);

    // Interleave the classes so batch boundaries cut through both
    let total = stayed + churned;
    let (mut s, mut c) = (0, 0);
    for i in 0..total {
        let pick_churned = c < churned && (s >= stayed || i % 5 >= 3);
        if pick_churned {
            let t: f64 = rng.gen_range(1.0..12.0);
            let m: f64 = rng.gen_range(80.0..110.0);
            tenure.push(t.round());
            monthly.push(m);
            revenue.push(t.round() * m);
            status.push("Churned");
            c += 1;
        } else {
            let t: f64 = rng.gen_range(30.0..72.0);
            let m: f64 = rng.gen_range(20.0..60.0);
            tenure.push(t.round());
            monthly.push(m);
            revenue.push(t.round() * m);
            status.push("Stayed");
            s += 1;
        }
    }

    df! {
        "Tenure_in_Months" => tenure,
        "Monthly_Charge" => monthly,
        "Total_Revenue" => revenue,
        "Customer_Status" => status,
    }
    .unwrap()
}

/// Churn table with `joined` extra rows whose status maps to no class
pub fn create_churn_dataframe_with_joined(stayed: usize, churned: usize, joined: usize) -> DataFrame {
    let mut df = create_churn_dataframe(stayed, churned);
    let extra = df! {
        "Tenure_in_Months" => vec![1.0f64; joined],
        "Monthly_Charge" => vec![50.0f64; joined],
        "Total_Revenue" => vec![50.0f64; joined],
        "Customer_Status" => vec!["Joined"; joined],
    }
    .unwrap();
    df.vstack_mut(&extra).unwrap();
    df
}

/// Small, fast forest settings for tests
pub fn quick_train_config() -> TrainConfig {
    TrainConfig {
        forest: ForestConfig {
            n_trees: 15,
            ..ForestConfig::default()
        },
        ..TrainConfig::default()
    }
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("fetched_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// In-memory stand-in for a database: named tables served in slices
#[derive(Default)]
pub struct MemorySource {
    tables: BTreeMap<String, DataFrame>,
    /// Height of every batch handed out, in order
    pub batch_sizes: Vec<usize>,
}

impl MemorySource {
    pub fn with_table(mut self, name: &str, df: DataFrame) -> Self {
        self.tables.insert(name.to_string(), df);
        self
    }
}

impl RowSource for MemorySource {
    fn table_names(&mut self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn row_count(&mut self, table: &str) -> Result<usize> {
        self.tables
            .get(table)
            .map(|df| df.height())
            .ok_or_else(|| ChurnError::TableNotFound(table.to_string()))
    }

    fn for_each_batch(
        &mut self,
        table: &str,
        batch_size: usize,
        sink: &mut BatchSink<'_>,
    ) -> Result<()> {
        let df = self
            .tables
            .get(table)
            .ok_or_else(|| ChurnError::TableNotFound(table.to_string()))?;

        let mut offset = 0;
        while offset < df.height() {
            let batch = df.slice(offset as i64, batch_size);
            offset += batch.height();
            self.batch_sizes.push(batch.height());
            sink(batch)?;
        }
        Ok(())
    }
}
