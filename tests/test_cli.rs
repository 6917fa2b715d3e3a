//! Tests for CLI argument parsing and the binary's exit behaviour

use assert_cmd::Command;
use churnflow::cli::{Cli, Commands};
use clap::Parser;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_cli_default_values() {
    let cli = Cli::parse_from(["churnflow", "run"]);

    assert!(!cli.strict, "Default strict should be false");
    assert_eq!(cli.env_file, PathBuf::from(".env"));
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.table, "stg_Churn");
            assert_eq!(args.batch_size, 1000);
            assert_eq!(args.data, PathBuf::from("data/fetched_data.csv"));
            assert_eq!(args.model, PathBuf::from("models/churn_model.json"));
            assert_eq!(args.output, PathBuf::from("data/predictions.csv"));
            assert_eq!(args.model_options.test_size, 0.3);
            assert_eq!(args.model_options.seed, 42);
            assert_eq!(args.model_options.n_trees, 100);
            assert_eq!(args.model_options.max_depth, 5);
            assert!(!args.model_options.no_resample);
        }
        other => panic!("expected run, got {:?}", other),
    }
}

#[test]
fn test_cli_train_options_map_to_config() {
    let cli = Cli::parse_from([
        "churnflow",
        "train",
        "--seed",
        "7",
        "--n-trees",
        "10",
        "--no-resample",
    ]);

    let Commands::Train(args) = cli.command else {
        panic!("expected train");
    };
    let config = args.model_options.to_train_config();
    assert_eq!(config.seed, 7);
    assert_eq!(config.forest.seed, 7);
    assert_eq!(config.forest.n_trees, 10);
    assert!(!config.resample);
    assert_eq!(config.min_rows, 50);
}

#[test]
fn test_cli_strict_is_global() {
    let cli = Cli::parse_from(["churnflow", "predict", "--strict"]);
    assert!(cli.strict);
}

#[test]
fn test_cli_rejects_invalid_test_size() {
    assert!(Cli::try_parse_from(["churnflow", "train", "--test-size", "1.5"]).is_err());
    assert!(Cli::try_parse_from(["churnflow", "train", "--test-size", "0"]).is_err());
}

#[test]
fn test_cli_rejects_zero_batch_size() {
    assert!(Cli::try_parse_from(["churnflow", "extract", "--batch-size", "0"]).is_err());
}

#[test]
fn test_binary_help_lists_stages() {
    Command::cargo_bin("churnflow")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("predict"));
}

#[test]
fn test_failed_stage_exits_zero_by_default() {
    let temp_dir = TempDir::new().unwrap();

    Command::cargo_bin("churnflow")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("predict")
        .assert()
        .success()
        .stdout(predicate::str::contains("Predictor failed"))
        .stdout(predicate::str::contains("Data file missing"));

    assert!(!temp_dir.path().join("data").join("predictions.csv").exists());
}

#[test]
fn test_failed_stage_exits_nonzero_when_strict() {
    let temp_dir = TempDir::new().unwrap();

    Command::cargo_bin("churnflow")
        .unwrap()
        .current_dir(temp_dir.path())
        .args(["--strict", "train"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Trainer failed"));
}

#[test]
fn test_run_stops_after_extract_failure() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();

    // A stale, perfectly trainable extract from an earlier run
    let mut csv = String::from("Tenure_in_Months,Monthly_Charge,Total_Revenue,Customer_Status\n");
    for i in 0..100 {
        if i % 5 >= 3 {
            csv.push_str(&format!("{},{},{},Churned\n", 1 + i % 12, 90.0, 90.0 * (1 + i % 12) as f64));
        } else {
            csv.push_str(&format!("{},{},{},Stayed\n", 30 + i % 40, 40.0, 40.0 * (30 + i % 40) as f64));
        }
    }
    std::fs::write(data_dir.join("fetched_data.csv"), csv).unwrap();

    Command::cargo_bin("churnflow")
        .unwrap()
        .current_dir(temp_dir.path())
        .env("POSTGRES_HOST", "127.0.0.1")
        .env("POSTGRES_PORT", "1")
        .args(["--env-file", "no-such.env", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Extractor failed"))
        .stdout(predicate::str::contains("Trainer").not())
        .stdout(predicate::str::contains("Predictor").not());

    assert!(!temp_dir.path().join("models").exists());
    assert!(!data_dir.join("predictions.csv").exists());
}
