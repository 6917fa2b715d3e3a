//! Tests for the prediction stage

use churnflow::config::{PREDICTED_STATUS_COLUMN, PREDICTION_COLUMN, PROBABILITY_COLUMN};
use churnflow::model::RandomForest;
use churnflow::pipeline::*;
use churnflow::ChurnError;
use polars::prelude::*;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn trained_model() -> RandomForest {
    let df = create_churn_dataframe(60, 40);
    train_model(&df, &quick_train_config()).unwrap().model
}

/// Write a model to a scratch directory and return both
fn saved_model(temp_dir: &TempDir) -> std::path::PathBuf {
    let path = temp_dir.path().join("models").join("churn_model.json");
    trained_model().save(&path).unwrap();
    path
}

#[test]
fn test_score_frame_appends_prediction_columns() {
    let df = create_churn_dataframe(30, 20);

    let (scored, _) = score_frame(df, &trained_model()).unwrap();

    assert_shape(&scored, 50, 7);
    assert_has_columns(&scored, &[PROBABILITY_COLUMN, PREDICTION_COLUMN, PREDICTED_STATUS_COLUMN]);

    let probabilities = scored.column(PROBABILITY_COLUMN).unwrap().f64().unwrap();
    assert!(probabilities
        .into_iter()
        .all(|p| p.is_some_and(|p| (0.0..=1.0).contains(&p))));
}

#[test]
fn test_predicted_status_matches_prediction() {
    let (scored, _) = score_frame(create_churn_dataframe(30, 20), &trained_model()).unwrap();

    let predictions = scored.column(PREDICTION_COLUMN).unwrap().i64().unwrap();
    let statuses = scored.column(PREDICTED_STATUS_COLUMN).unwrap().str().unwrap();

    let mut seen = [false; 2];
    for (prediction, status) in predictions.into_iter().zip(statuses.into_iter()) {
        let prediction = prediction.unwrap();
        let status = status.unwrap();
        assert_eq!(status == "Churned", prediction == 1);
        assert_eq!(status == "Stayed", prediction == 0);
        seen[prediction as usize] = true;
    }
    assert!(seen[0] && seen[1], "Both classes should be predicted");
}

#[test]
fn test_missing_feature_columns_are_listed() {
    let df = create_churn_dataframe(30, 20)
        .drop("Total_Revenue")
        .unwrap()
        .drop("Tenure_in_Months")
        .unwrap();

    let err = score_frame(df, &trained_model()).unwrap_err();

    match err {
        ChurnError::MissingFeatures(missing) => {
            assert_eq!(missing, vec!["Tenure_in_Months", "Total_Revenue"]);
        }
        other => panic!("expected MissingFeatures, got {:?}", other),
    }
}

#[test]
fn test_missing_values_are_filled_with_batch_median() {
    let df = df! {
        "Tenure_in_Months" => [Some(2.0f64), None, Some(40.0), Some(60.0), None],
        "Monthly_Charge" => [Some(95.0f64), Some(30.0), Some(f64::NAN), Some(25.0), Some(50.0)],
        "Total_Revenue" => [190.0f64, 900.0, 1600.0, 1500.0, 2000.0],
    }
    .unwrap();

    let (scored, stats) = score_frame(df, &trained_model()).unwrap();

    let tenure = &stats[0];
    assert_eq!(tenure.missing_before, 2);
    assert_eq!(tenure.missing_after, 0);
    assert_eq!(tenure.fill_value, Some(40.0));

    let charge = &stats[1];
    assert_eq!(charge.missing_before, 1);
    assert_eq!(charge.fill_value, Some((30.0 + 50.0) / 2.0));

    assert_eq!(stats[2].missing_before, 0);

    let filled: Vec<Option<f64>> = scored
        .column("Tenure_in_Months")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(filled, vec![Some(2.0), Some(40.0), Some(40.0), Some(60.0), Some(40.0)]);
    assert_eq!(scored.column(PROBABILITY_COLUMN).unwrap().null_count(), 0);
}

#[test]
fn test_imputation_follows_each_batch_median() {
    // The same incomplete customer scored inside two different batches is
    // filled with two different values: medians are never carried over from
    // training or from another batch.
    let customer = (None::<f64>, 70.0f64, 700.0f64);

    let batch_a = df! {
        "Tenure_in_Months" => [customer.0, Some(5.0), Some(7.0)],
        "Monthly_Charge" => [customer.1, 90.0, 95.0],
        "Total_Revenue" => [customer.2, 450.0, 665.0],
    }
    .unwrap();
    let batch_b = df! {
        "Tenure_in_Months" => [customer.0, Some(50.0), Some(70.0)],
        "Monthly_Charge" => [customer.1, 30.0, 35.0],
        "Total_Revenue" => [customer.2, 1500.0, 2450.0],
    }
    .unwrap();

    let model = trained_model();
    let (_, stats_a) = score_frame(batch_a, &model).unwrap();
    let (_, stats_b) = score_frame(batch_b, &model).unwrap();

    assert_eq!(stats_a[0].fill_value, Some(6.0));
    assert_eq!(stats_b[0].fill_value, Some(60.0));
}

#[test]
fn test_run_predict_writes_output() {
    let mut df = create_churn_dataframe(60, 40);
    let (temp_dir, csv_path) = create_temp_csv(&mut df);
    let model_path = saved_model(&temp_dir);
    let output = temp_dir.path().join("out").join("predictions.csv");

    let report = run_predict(&csv_path, &model_path, &output).unwrap();

    assert_eq!(report.rows, 100);
    assert_eq!(report.columns, 7);
    assert_eq!(report.status_counts.iter().map(|(_, n)| n).sum::<usize>(), 100);
    assert!(report.status_counts.windows(2).all(|w| w[0].1 >= w[1].1));

    let written = load_dataframe(&output).unwrap();
    assert_shape(&written, 100, 7);
}

#[test]
fn test_run_predict_missing_data_file() {
    let temp_dir = TempDir::new().unwrap();
    let model_path = saved_model(&temp_dir);
    let output = temp_dir.path().join("predictions.csv");

    let err = run_predict(&temp_dir.path().join("missing.csv"), &model_path, &output).unwrap_err();

    assert!(matches!(err, ChurnError::FileMissing { kind: "Data", .. }));
    assert!(!output.exists());
}

#[test]
fn test_run_predict_missing_model_file() {
    let mut df = create_churn_dataframe(60, 40);
    let (temp_dir, csv_path) = create_temp_csv(&mut df);
    let output = temp_dir.path().join("predictions.csv");

    let err = run_predict(&csv_path, &temp_dir.path().join("missing.json"), &output).unwrap_err();

    assert!(matches!(err, ChurnError::FileMissing { kind: "Model", .. }));
    assert!(err.to_string().contains("Model file missing"));
    assert!(!output.exists());
}

#[test]
fn test_run_predict_missing_columns_writes_nothing() {
    let mut df = create_churn_dataframe(60, 40).drop("Monthly_Charge").unwrap();
    let (temp_dir, csv_path) = create_temp_csv(&mut df);
    let model_path = saved_model(&temp_dir);
    let output = temp_dir.path().join("predictions.csv");

    let err = run_predict(&csv_path, &model_path, &output).unwrap_err();

    assert!(matches!(err, ChurnError::MissingFeatures(_)));
    assert!(!output.exists());
}
