//! Relational row sources
//!
//! The extractor only needs three things from a database: the catalog of
//! table names, a row count, and a way to stream `SELECT *` in batches.
//! `RowSource` captures exactly that so the extraction logic does not depend
//! on a particular driver.

use polars::prelude::*;

use crate::error::{ChurnError, Result};

/// Receives each fetched batch in source order
pub type BatchSink<'a> = dyn FnMut(DataFrame) -> Result<()> + 'a;

pub trait RowSource {
    /// Names of the user tables visible to this connection
    fn table_names(&mut self) -> Result<Vec<String>>;

    /// Number of rows currently in `table`
    fn row_count(&mut self, table: &str) -> Result<usize>;

    /// Stream every row of `table` in batches of at most `batch_size` rows
    fn for_each_batch(
        &mut self,
        table: &str,
        batch_size: usize,
        sink: &mut BatchSink<'_>,
    ) -> Result<()>;
}

/// Storage type a textual database column is converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Boolean,
    Integer,
    Float,
    Text,
}

/// Build a typed batch from rows of textual cells.
///
/// `None` cells become nulls. Boolean cells accept the PostgreSQL text forms
/// (`t`/`f`) as well as `true`/`false`.
pub fn frame_from_text_rows(
    columns: &[(String, ColumnKind)],
    rows: &[Vec<Option<String>>],
) -> Result<DataFrame> {
    let mut out: Vec<Column> = Vec::with_capacity(columns.len());

    for (idx, (name, kind)) in columns.iter().enumerate() {
        let cells = rows.iter().map(|row| row.get(idx).and_then(|c| c.as_deref()));

        let column = match kind {
            ColumnKind::Boolean => {
                let values = cells
                    .map(|cell| cell.map(|v| parse_bool(name, v)).transpose())
                    .collect::<Result<Vec<Option<bool>>>>()?;
                Column::new(name.as_str().into(), values)
            }
            ColumnKind::Integer => {
                let values = cells
                    .map(|cell| {
                        cell.map(|v| {
                            v.trim().parse::<i64>().map_err(|_| ChurnError::InvalidValue {
                                column: name.clone(),
                                expected: "integer",
                                value: v.to_string(),
                            })
                        })
                        .transpose()
                    })
                    .collect::<Result<Vec<Option<i64>>>>()?;
                Column::new(name.as_str().into(), values)
            }
            ColumnKind::Float => {
                let values = cells
                    .map(|cell| {
                        cell.map(|v| {
                            v.trim().parse::<f64>().map_err(|_| ChurnError::InvalidValue {
                                column: name.clone(),
                                expected: "number",
                                value: v.to_string(),
                            })
                        })
                        .transpose()
                    })
                    .collect::<Result<Vec<Option<f64>>>>()?;
                Column::new(name.as_str().into(), values)
            }
            ColumnKind::Text => {
                let values: Vec<Option<String>> =
                    cells.map(|cell| cell.map(|v| v.to_string())).collect();
                Column::new(name.as_str().into(), values)
            }
        };
        out.push(column);
    }

    Ok(DataFrame::new(out)?)
}

fn parse_bool(column: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "t" | "true" | "TRUE" | "True" | "1" => Ok(true),
        "f" | "false" | "FALSE" | "False" | "0" => Ok(false),
        other => Err(ChurnError::InvalidValue {
            column: column.to_string(),
            expected: "boolean",
            value: other.to_string(),
        }),
    }
}
