//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    ForestConfig, TrainConfig, DEFAULT_BATCH_SIZE, DEFAULT_DATA_PATH, DEFAULT_MODEL_PATH,
    DEFAULT_PREDICTIONS_PATH, DEFAULT_SEED, DEFAULT_TABLE, DEFAULT_TEST_SIZE,
};

/// churnflow - Extract customer data, train a churn classifier and score new rows
#[derive(Parser, Debug)]
#[command(name = "churnflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Exit with a non-zero status when a stage fails.
    /// Without it, failures are reported and the process still exits successfully.
    #[arg(long, global = true, default_value = "false")]
    pub strict: bool,

    /// File holding POSTGRES_* connection settings
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy a database table into a tabular file
    Extract(ExtractArgs),

    /// Train the churn classifier on an extracted file
    Train(TrainArgs),

    /// Score an extracted file with a trained classifier
    Predict(PredictArgs),

    /// Extract, train and predict in order, stopping at the first failure
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Source table name (case-sensitive)
    #[arg(short, long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Output file path (CSV or Parquet, determined by extension)
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub output: PathBuf,

    /// Rows fetched per round trip
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = validate_batch_size)]
    pub batch_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Extracted data file
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub input: PathBuf,

    /// Where the fitted model is written
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    #[command(flatten)]
    pub model_options: ModelOptions,
}

/// Training hyperparameters shared by `train` and `run`
#[derive(Args, Debug, Clone)]
pub struct ModelOptions {
    /// Fraction of labelled rows held out for evaluation (0.0 to 1.0, exclusive)
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE, value_parser = validate_test_size)]
    pub test_size: f64,

    /// Seed for the split, resampling and the forest
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Skip SMOTE + ENN on the training partition
    #[arg(long, default_value = "false")]
    pub no_resample: bool,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    pub n_trees: usize,

    /// Maximum depth of each tree
    #[arg(long, default_value_t = 5)]
    pub max_depth: usize,
}

impl ModelOptions {
    pub fn to_train_config(&self) -> TrainConfig {
        TrainConfig {
            test_size: self.test_size,
            seed: self.seed,
            resample: !self.no_resample,
            forest: ForestConfig {
                n_trees: self.n_trees,
                max_depth: self.max_depth,
                seed: self.seed,
                ..ForestConfig::default()
            },
            ..TrainConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Data file to score
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub input: PathBuf,

    /// Trained model file
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension)
    #[arg(short, long, default_value = DEFAULT_PREDICTIONS_PATH)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Source table name (case-sensitive)
    #[arg(short, long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Rows fetched per round trip
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = validate_batch_size)]
    pub batch_size: usize,

    /// Extracted data file, written by the first stage and read by the others
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Trained model file
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Predictions output file
    #[arg(short, long, default_value = DEFAULT_PREDICTIONS_PATH)]
    pub output: PathBuf,

    #[command(flatten)]
    pub model_options: ModelOptions,
}

/// Validator for the held-out fraction
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_size must be between 0.0 and 1.0 (exclusive), got {}",
            value
        ))
    }
}

/// Validator for batch_size parameter
fn validate_batch_size(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid row count", s))?;

    if value == 0 {
        Err("batch_size must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
