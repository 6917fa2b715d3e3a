//! Pipeline defaults and settings
//!
//! Paths, thresholds and model hyperparameters live here so that the CLI can
//! override them; database settings come from the environment.

use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ChurnError, Result};

/// Source table read by the extractor
pub const DEFAULT_TABLE: &str = "stg_Churn";
/// Rows fetched per round trip during extraction
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Exported files smaller than this are treated as a failed export
pub const MIN_EXPORT_BYTES: u64 = 1024;

pub const DEFAULT_DATA_PATH: &str = "data/fetched_data.csv";
pub const DEFAULT_MODEL_PATH: &str = "models/churn_model.json";
pub const DEFAULT_PREDICTIONS_PATH: &str = "data/predictions.csv";

/// Model inputs, in the order the forest sees them
pub const FEATURE_COLUMNS: [&str; 3] = ["Tenure_in_Months", "Monthly_Charge", "Total_Revenue"];
pub const STATUS_COLUMN: &str = "Customer_Status";

pub const PROBABILITY_COLUMN: &str = "Churn_Probability";
pub const PREDICTION_COLUMN: &str = "Churn_Prediction";
pub const PREDICTED_STATUS_COLUMN: &str = "churn_status_predicted";

pub const MIN_TRAINING_ROWS: usize = 50;
pub const DEFAULT_TEST_SIZE: f64 = 0.3;
pub const DEFAULT_SEED: u64 = 42;

/// Number of rows polars inspects to infer CSV column types
pub const INFER_SCHEMA_LENGTH: usize = 10_000;

/// Class weighting applied while growing trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample counts once
    Uniform,
    /// `n_samples / (n_classes * class_count)`
    Balanced,
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub class_weight: ClassWeight,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 5,
            min_samples_split: 2,
            class_weight: ClassWeight::Balanced,
            seed: DEFAULT_SEED,
        }
    }
}

/// Everything the trainer needs besides the data itself
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub features: Vec<String>,
    pub status_column: String,
    pub min_rows: usize,
    pub test_size: f64,
    pub seed: u64,
    /// Apply SMOTE + ENN to the training partition when it holds both classes
    pub resample: bool,
    pub smote_neighbors: usize,
    pub enn_neighbors: usize,
    pub forest: ForestConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            features: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            status_column: STATUS_COLUMN.to_string(),
            min_rows: MIN_TRAINING_ROWS,
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            resample: true,
            smote_neighbors: 5,
            enn_neighbors: 3,
            forest: ForestConfig::default(),
        }
    }
}

impl TrainConfig {
    /// Reject settings that cannot produce a usable split or forest
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ChurnError::InvalidConfig(format!(
                "test size must be between 0 and 1 (exclusive), got {}",
                self.test_size
            )));
        }
        if self.features.is_empty() {
            return Err(ChurnError::InvalidConfig(
                "at least one feature column is required".to_string(),
            ));
        }
        if self.forest.n_trees == 0 {
            return Err(ChurnError::InvalidConfig(
                "the forest needs at least one tree".to_string(),
            ));
        }
        if self.forest.max_depth == 0 {
            return Err(ChurnError::InvalidConfig(
                "max depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// PostgreSQL connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            dbname: "db_churn".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DbConfig {
    /// Read `POSTGRES_*` variables, falling back to local defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = std::env::var("POSTGRES_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let config = Self {
            host: std::env::var("POSTGRES_HOST").unwrap_or(defaults.host),
            port,
            dbname: std::env::var("POSTGRES_DB").unwrap_or(defaults.dbname),
            user: std::env::var("POSTGRES_USER").unwrap_or(defaults.user),
            password: std::env::var("POSTGRES_PASSWORD").unwrap_or(defaults.password),
            connect_timeout: defaults.connect_timeout,
        };

        info!(
            "DB Config: Host={}, Port={}, DB={}, User={}",
            config.host, config.port, config.dbname, config.user
        );
        config
    }

    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password)
            .application_name("churnflow")
            .connect_timeout(self.connect_timeout);
        config
    }
}

/// Load variables from an env file, leaving already-set variables alone.
///
/// A missing file is not an error; the defaults and the process
/// environment still apply.
pub fn load_env_file(path: &Path) {
    match dotenv::from_path(path) {
        Ok(()) => info!("Loaded environment from {}", path.display()),
        Err(e) => info!("No environment file loaded from {}: {}", path.display(), e),
    }
}
