//! Training stage: extracted table → fitted churn classifier

use std::path::Path;

use log::{debug, warn};
use polars::prelude::*;

use crate::config::TrainConfig;
use crate::error::{ChurnError, Result};
use crate::model::RandomForest;
use crate::pipeline::features::{ensure_features_present, feature_matrix, impute_median, ImputationStat};
use crate::pipeline::labels::{count_mapped_records, derive_labels, ensure_statuses_present, StatusMapping};
use crate::pipeline::loader::load_dataframe;
use crate::pipeline::resample::{train_test_split, ClassCounts, SmoteEnn, Split};
use crate::report::ClassificationReport;
use crate::utils::{
    finish_with_success, finish_with_warning, fit_spinner, print_info, print_warning, resample_spinner,
};

/// Everything the training stage learned about the data and the fit
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Rows labelled Stayed or Churned
    pub usable_rows: usize,
    /// Rows with any other status
    pub ignored_rows: usize,
    pub imputation: Vec<ImputationStat>,
    /// Indices into the usable rows
    pub split: Split,
    pub counts_before: ClassCounts,
    pub counts_after: ClassCounts,
    pub resampled: bool,
    pub training_samples: usize,
    pub test_churn_rate: f64,
    pub evaluation: ClassificationReport,
}

impl TrainReport {
    pub fn imputed_cells(&self) -> usize {
        self.imputation.iter().map(|s| s.missing_before).sum()
    }
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: RandomForest,
    pub report: TrainReport,
}

/// Fit a forest on the labelled rows of `df`.
///
/// Rows whose status maps to neither class are dropped before anything
/// else. The labelled rows are split once with `config.seed`; resampling only
/// ever sees the training partition and the report is computed on the
/// untouched test partition.
pub fn train_model(df: &DataFrame, config: &TrainConfig) -> Result<TrainOutcome> {
    config.validate()?;
    let mapping = StatusMapping::default();

    ensure_statuses_present(df, &config.status_column, &mapping)?;
    ensure_features_present(df, &config.features)?;

    let labels = derive_labels(df, &config.status_column, &mapping)?;
    let labelled: Vec<IdxSize> = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_some())
        .map(|(i, _)| i as IdxSize)
        .collect();
    let y: Vec<u8> = labels.iter().flatten().copied().collect();
    let (churned, stayed, ignored_rows) = count_mapped_records(df, &config.status_column, &mapping)?;

    print_info(&format!(
        "Usable records: {} ({} churned, {} stayed, {} ignored)",
        y.len(),
        churned,
        stayed,
        ignored_rows
    ));
    if y.len() < config.min_rows {
        return Err(ChurnError::InsufficientRows {
            found: y.len(),
            required: config.min_rows,
        });
    }

    let usable = df.take(&IdxCa::from_vec("idx".into(), labelled))?;
    let (usable, imputation) = impute_median(usable, &config.features)?;
    for stat in imputation.iter().filter(|s| s.missing_before > 0) {
        print_warning(&format!(
            "{}: filled {} missing value(s) with median {:.4}",
            stat.feature,
            stat.missing_before,
            stat.fill_value.unwrap_or_default()
        ));
    }

    let split = train_test_split(y.len(), config.test_size, config.seed)?;
    let x_train = feature_matrix(&usable, &config.features, Some(&split.train))?;
    let y_train: Vec<u8> = split.train.iter().map(|&i| y[i]).collect();
    let x_test = feature_matrix(&usable, &config.features, Some(&split.test))?;
    let y_test: Vec<u8> = split.test.iter().map(|&i| y[i]).collect();

    let counts_before = ClassCounts::from_labels(&y_train);
    print_info(&format!("Class distribution before resampling: {}", counts_before));

    let (x_fit, y_fit, resampled) = if !config.resample {
        print_info("Resampling disabled");
        (x_train, y_train, false)
    } else if counts_before.n_classes() < 2 {
        warn!("training partition holds a single class: {}", counts_before);
        print_warning("Only one class in training partition, skipping resampling");
        (x_train, y_train, false)
    } else {
        let spinner = resample_spinner(y_train.len());
        let resampler = SmoteEnn::new(config.smote_neighbors, config.enn_neighbors, config.seed);
        let (x_res, y_res) = resampler.fit_resample(&x_train, &y_train)?;
        if y_res.is_empty() {
            finish_with_warning(&spinner, "ENN removed every sample, fitting on the original partition");
            (x_train, y_train, false)
        } else {
            finish_with_success(&spinner, "Resampling complete");
            (x_res, y_res, true)
        }
    };
    let counts_after = ClassCounts::from_labels(&y_fit);
    if resampled {
        print_info(&format!("Class distribution after resampling: {}", counts_after));
    }

    let spinner = fit_spinner(config.forest.n_trees, y_fit.len());
    let model = RandomForest::fit(&x_fit, &y_fit, config.features.clone(), &config.forest)?;
    finish_with_success(&spinner, &format!("Fitted {} trees", model.n_trees()));
    debug!(
        "forest fitted on {} samples, class weights {:?}",
        y_fit.len(),
        model.class_weights()
    );

    let evaluation = ClassificationReport::compute(&y_test, &model.predict(&x_test));

    Ok(TrainOutcome {
        model,
        report: TrainReport {
            usable_rows: y.len(),
            ignored_rows,
            imputation,
            test_churn_rate: ClassCounts::from_labels(&y_test).churn_rate(),
            split,
            counts_before,
            counts_after,
            resampled,
            training_samples: y_fit.len(),
            evaluation,
        },
    })
}

/// Load `input`, train, and write the model to `model_path`.
pub fn run_train(input: &Path, model_path: &Path, config: &TrainConfig) -> Result<TrainReport> {
    let df = load_dataframe(input)?;
    print_info(&format!("Loaded {} rows from {}", df.height(), input.display()));

    let outcome = train_model(&df, config)?;
    outcome.report.evaluation.display();

    outcome.model.save(model_path)?;
    print_info(&format!("Model saved to {}", model_path.display()));
    Ok(outcome.report)
}
