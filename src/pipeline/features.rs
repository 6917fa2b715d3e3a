//! Feature column validation, median imputation and matrix extraction

use ndarray::Array2;
use polars::prelude::*;

use crate::error::{ChurnError, Result};

/// Missing-value bookkeeping for one imputed feature
#[derive(Debug, Clone, PartialEq)]
pub struct ImputationStat {
    pub feature: String,
    pub missing_before: usize,
    pub missing_after: usize,
    /// Median used for filling; `None` when nothing was missing
    pub fill_value: Option<f64>,
}

/// Required features absent from the frame, in required order
pub fn missing_features<S: AsRef<str>>(df: &DataFrame, required: &[S]) -> Vec<String> {
    let present: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
    required
        .iter()
        .map(|f| f.as_ref())
        .filter(|f| !present.contains(f))
        .map(|f| f.to_string())
        .collect()
}

pub fn ensure_features_present<S: AsRef<str>>(df: &DataFrame, required: &[S]) -> Result<()> {
    let missing = missing_features(df, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChurnError::MissingFeatures(missing))
    }
}

/// Numeric values of a column with nulls and NaN as `None`
pub fn numeric_values(df: &DataFrame, feature: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(feature)
        .map_err(|_| ChurnError::MissingFeatures(vec![feature.to_string()]))?;
    let cast = column.cast(&DataType::Float64).map_err(|_| ChurnError::InvalidValue {
        column: feature.to_string(),
        expected: "number",
        value: column.dtype().to_string(),
    })?;

    // A strict cast turns unparsable text into nulls; report it instead.
    if cast.null_count() > column.null_count() {
        return Err(ChurnError::InvalidValue {
            column: feature.to_string(),
            expected: "number",
            value: format!("{} non-numeric cell(s)", cast.null_count() - column.null_count()),
        });
    }

    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Median of the present values; the mean of the two middle values for an
/// even count. `None` when no value is present.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));

    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Fill missing values of each feature with that feature's own median over
/// `df`.
///
/// Features without missing values are left as they are, dtype included;
/// filled features become Float64.
pub fn impute_median<S: AsRef<str>>(
    mut df: DataFrame,
    features: &[S],
) -> Result<(DataFrame, Vec<ImputationStat>)> {
    let mut stats = Vec::with_capacity(features.len());

    for feature in features.iter().map(|f| f.as_ref()) {
        let values = numeric_values(&df, feature)?;
        let missing_before = values.iter().filter(|v| v.is_none()).count();

        if missing_before == 0 {
            stats.push(ImputationStat {
                feature: feature.to_string(),
                missing_before: 0,
                missing_after: 0,
                fill_value: None,
            });
            continue;
        }

        let fill = median(&values).ok_or_else(|| ChurnError::EmptyFeature(feature.to_string()))?;
        let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(fill)).collect();
        df.with_column(Column::new(feature.into(), filled))?;

        let missing_after = numeric_values(&df, feature)?
            .iter()
            .filter(|v| v.is_none())
            .count();
        stats.push(ImputationStat {
            feature: feature.to_string(),
            missing_before,
            missing_after,
            fill_value: Some(fill),
        });
    }

    Ok((df, stats))
}

/// Dense matrix of `features` for the selected rows (all rows when `rows` is
/// `None`). Every selected cell must hold a number.
pub fn feature_matrix<S: AsRef<str>>(
    df: &DataFrame,
    features: &[S],
    rows: Option<&[usize]>,
) -> Result<Array2<f64>> {
    let columns: Vec<Vec<Option<f64>>> = features
        .iter()
        .map(|f| numeric_values(df, f.as_ref()))
        .collect::<Result<_>>()?;

    let all_rows: Vec<usize>;
    let selected = match rows {
        Some(r) => r,
        None => {
            all_rows = (0..df.height()).collect();
            &all_rows
        }
    };

    let mut matrix = Array2::zeros((selected.len(), features.len()));
    for (r, &i) in selected.iter().enumerate() {
        for (j, column) in columns.iter().enumerate() {
            matrix[[r, j]] = column[i].ok_or_else(|| ChurnError::InvalidValue {
                column: features[j].as_ref().to_string(),
                expected: "number",
                value: format!("missing value in row {}", i),
            })?;
        }
    }

    Ok(matrix)
}
