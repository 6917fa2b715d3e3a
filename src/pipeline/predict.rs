//! Prediction stage: extracted table + model → table with churn scores

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::config::{PREDICTED_STATUS_COLUMN, PREDICTION_COLUMN, PROBABILITY_COLUMN};
use crate::error::{ChurnError, Result};
use crate::model::RandomForest;
use crate::pipeline::features::{ensure_features_present, feature_matrix, impute_median, ImputationStat};
use crate::pipeline::labels::status_for_prediction;
use crate::pipeline::loader::{load_dataframe, save_dataset};
use crate::utils::{print_info, print_success};

/// Outcome of a successful scoring run
#[derive(Debug, Clone)]
pub struct PredictReport {
    pub rows: usize,
    /// Column count of the written table
    pub columns: usize,
    pub imputation: Vec<ImputationStat>,
    /// Predicted status and row count, most frequent first
    pub status_counts: Vec<(String, usize)>,
    pub output: PathBuf,
}

/// Score every row of `df` with `model`.
///
/// The features the model was fitted on must all be present. Their missing
/// values are filled with medians of this frame before scoring. The three
/// prediction columns are appended, replacing columns of the same name.
pub fn score_frame(df: DataFrame, model: &RandomForest) -> Result<(DataFrame, Vec<ImputationStat>)> {
    let features = model.feature_names();
    ensure_features_present(&df, features)?;

    let (mut df, imputation) = impute_median(df, features)?;
    let x = feature_matrix(&df, features, None)?;

    let probabilities = model.predict_proba(&x);
    let predictions = model.predict(&x);
    let statuses: Vec<&str> = predictions.iter().map(|&p| status_for_prediction(p)).collect();
    let predictions: Vec<i64> = predictions.into_iter().map(i64::from).collect();

    df.with_column(Column::new(PROBABILITY_COLUMN.into(), probabilities))?;
    df.with_column(Column::new(PREDICTION_COLUMN.into(), predictions))?;
    df.with_column(Column::new(PREDICTED_STATUS_COLUMN.into(), statuses))?;

    Ok((df, imputation))
}

/// Predicted status counts, most frequent first, ties by name
pub fn status_counts(df: &DataFrame) -> Result<Vec<(String, usize)>> {
    let column = df.column(PREDICTED_STATUS_COLUMN)?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for status in column.str()?.into_iter().flatten() {
        *counts.entry(status.to_string()).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

/// Load `input` and the model at `model_path`, score, and write `output`.
///
/// Nothing is written unless every earlier step succeeded.
pub fn run_predict(input: &Path, model_path: &Path, output: &Path) -> Result<PredictReport> {
    if !input.exists() {
        return Err(ChurnError::FileMissing {
            kind: "Data",
            path: input.to_path_buf(),
        });
    }
    if !model_path.exists() {
        return Err(ChurnError::FileMissing {
            kind: "Model",
            path: model_path.to_path_buf(),
        });
    }

    let df = load_dataframe(input)?;
    print_info(&format!("Loaded data: {} rows", df.height()));
    let names: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
    print_info(&format!("Columns: {}", names.join(", ")));

    let model = RandomForest::load(model_path)?;
    print_success(&format!("Model loaded from {}", model_path.display()));

    let (mut scored, imputation) = score_frame(df, &model)?;
    for stat in &imputation {
        print_info(&format!(
            "{}: {} missing before imputation, {} after",
            stat.feature, stat.missing_before, stat.missing_after
        ));
    }

    save_dataset(&mut scored, output)?;

    Ok(PredictReport {
        rows: scored.height(),
        columns: scored.width(),
        imputation,
        status_counts: status_counts(&scored)?,
        output: output.to_path_buf(),
    })
}
