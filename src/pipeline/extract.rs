//! Table extraction: database table → tabular file

use std::path::{Path, PathBuf};

use log::debug;
use polars::prelude::*;

use crate::config::{DbConfig, MIN_EXPORT_BYTES};
use crate::error::{ChurnError, Result};
use crate::pipeline::loader::{file_size, save_dataset};
use crate::pipeline::postgres::PgSource;
use crate::pipeline::source::RowSource;
use crate::utils::{fetch_bar, finish_with_success, print_info, record_batch};

/// Outcome of a successful extraction
#[derive(Debug, Clone)]
pub struct ExtractReport {
    pub table: String,
    pub rows: usize,
    pub columns: usize,
    pub batches: usize,
    pub output: PathBuf,
    pub file_size: u64,
}

/// Copy every row of `table` from `source` into `output`.
///
/// The table must exist in the source catalog and hold at least one row.
/// Rows are fetched `batch_size` at a time and concatenated in arrival
/// order. The written file must be at least [`MIN_EXPORT_BYTES`] long.
pub fn extract_table<S: RowSource + ?Sized>(
    source: &mut S,
    table: &str,
    output: &Path,
    batch_size: usize,
) -> Result<ExtractReport> {
    if batch_size == 0 {
        return Err(ChurnError::InvalidConfig(
            "batch size must be at least 1".to_string(),
        ));
    }

    let tables = source.table_names()?;
    if !tables.iter().any(|t| t == table) {
        return Err(ChurnError::TableNotFound(table.to_string()));
    }

    let count = source.row_count(table)?;
    print_info(&format!("Found {} records in {}", count, table));
    if count == 0 {
        return Err(ChurnError::EmptyTable(table.to_string()));
    }

    let pb = fetch_bar(table, count);
    let mut combined: Option<DataFrame> = None;
    let mut batches = 0usize;
    let mut fetched = 0usize;

    source.for_each_batch(table, batch_size, &mut |batch: DataFrame| {
        batches += 1;
        fetched += batch.height();
        debug!("Batch {}: {} rows ({} total)", batches, batch.height(), fetched);
        record_batch(&pb, batch.height());

        match combined.as_mut() {
            Some(df) => {
                df.vstack_mut(&batch)?;
            }
            None => combined = Some(batch),
        }
        Ok(())
    })?;

    let mut df = match combined {
        Some(df) if df.height() > 0 => df,
        _ => return Err(ChurnError::EmptyTable(table.to_string())),
    };
    finish_with_success(&pb, &format!("Fetched {} rows in {} batch(es)", fetched, batches));

    print_info(&format!("Saving file at: {}", output.display()));
    save_dataset(&mut df, output)?;

    let size = file_size(output)?;
    if size < MIN_EXPORT_BYTES {
        return Err(ChurnError::UndersizedOutput {
            size,
            minimum: MIN_EXPORT_BYTES,
        });
    }

    Ok(ExtractReport {
        table: table.to_string(),
        rows: df.height(),
        columns: df.width(),
        batches,
        output: output.to_path_buf(),
        file_size: size,
    })
}

/// Connect with `db`, extract `table` into `output`, release the connection.
pub fn run_extract(
    db: &DbConfig,
    table: &str,
    output: &Path,
    batch_size: usize,
) -> Result<ExtractReport> {
    let mut source = PgSource::connect(db)?;
    extract_table(&mut source, table, output, batch_size)
}
