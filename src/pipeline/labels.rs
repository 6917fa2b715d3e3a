//! Customer status handling
//!
//! Maps the textual `Customer_Status` column onto the binary churn target
//! and back. Rows whose status is neither side of the mapping (for example
//! "Joined") carry no label and are left out of training.

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ChurnError, Result};

/// Status values that map to the two classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMapping {
    /// Value that maps to 1
    pub churned: String,
    /// Value that maps to 0
    pub stayed: String,
}

impl Default for StatusMapping {
    fn default() -> Self {
        Self {
            churned: "Churned".to_string(),
            stayed: "Stayed".to_string(),
        }
    }
}

impl StatusMapping {
    pub fn label_for(&self, status: &str) -> Option<u8> {
        if status == self.churned {
            Some(1)
        } else if status == self.stayed {
            Some(0)
        } else {
            None
        }
    }
}

/// Human-readable status for a hard prediction: 0 → "Stayed", 1 → "Churned"
pub fn status_for_prediction(prediction: u8) -> &'static str {
    match prediction {
        1 => "Churned",
        _ => "Stayed",
    }
}

/// Distinct non-null status values, sorted
pub fn available_statuses(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let values = column_to_string_vec(status_column(df, column)?)?;
    let unique: BTreeSet<String> = values.into_iter().flatten().collect();
    Ok(unique.into_iter().collect())
}

/// Fail unless both sides of the mapping occur in the status column
pub fn ensure_statuses_present(df: &DataFrame, column: &str, mapping: &StatusMapping) -> Result<()> {
    let available = available_statuses(df, column)?;
    let missing: Vec<String> = [&mapping.churned, &mapping.stayed]
        .into_iter()
        .filter(|required| !available.contains(*required))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChurnError::MissingStatuses(missing))
    }
}

/// Per-row label: `Some(1)` churned, `Some(0)` stayed, `None` for anything else
pub fn derive_labels(df: &DataFrame, column: &str, mapping: &StatusMapping) -> Result<Vec<Option<u8>>> {
    let values = column_to_string_vec(status_column(df, column)?)?;
    Ok(values
        .iter()
        .map(|v| v.as_deref().and_then(|s| mapping.label_for(s)))
        .collect())
}

/// Count how many records are churned, stayed, or ignored
pub fn count_mapped_records(
    df: &DataFrame,
    column: &str,
    mapping: &StatusMapping,
) -> Result<(usize, usize, usize)> {
    let labels = derive_labels(df, column, mapping)?;

    let churned = labels.iter().filter(|v| **v == Some(1)).count();
    let stayed = labels.iter().filter(|v| **v == Some(0)).count();
    let ignored = labels.iter().filter(|v| v.is_none()).count();

    Ok((churned, stayed, ignored))
}

fn status_column<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Column> {
    df.column(column)
        .map_err(|_| ChurnError::MissingFeatures(vec![column.to_string()]))
}

/// Convert a column to a Vec of Option<String> for comparison
fn column_to_string_vec(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}
