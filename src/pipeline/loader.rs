//! Dataset loading and saving for CSV and Parquet files

use std::path::Path;

use polars::prelude::*;

use crate::config::INFER_SCHEMA_LENGTH;
use crate::error::{ChurnError, Result};

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a dataset from a file (CSV or Parquet based on extension)
pub fn load_dataset(path: &Path) -> Result<LazyFrame> {
    let extension = file_extension(path);

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_LENGTH))
            .finish()?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?,
        _ => return Err(ChurnError::UnsupportedFormat(extension)),
    };

    Ok(lf)
}

/// Load and collect a dataset into memory
pub fn load_dataframe(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(ChurnError::FileMissing {
            kind: "Data",
            path: path.to_path_buf(),
        });
    }
    Ok(load_dataset(path)?.collect()?)
}

/// Save dataset to file (CSV or Parquet based on extension).
///
/// Parent directories are created and an existing file is overwritten.
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = file_extension(path);
    if extension != "csv" && extension != "parquet" {
        return Err(ChurnError::UnsupportedFormat(extension));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ChurnError::io(parent, e))?;
    }

    let mut file = std::fs::File::create(path).map_err(|e| ChurnError::io(path, e))?;
    match extension.as_str() {
        "csv" => {
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        _ => {
            ParquetWriter::new(file).finish(df)?;
        }
    }

    Ok(())
}

/// Size of a file on disk in bytes
pub fn file_size(path: &Path) -> Result<u64> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| ChurnError::io(path, e))
}
