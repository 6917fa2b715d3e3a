//! Pipeline module - the extract, train and predict stages

pub mod extract;
pub mod features;
pub mod labels;
pub mod loader;
pub mod postgres;
pub mod predict;
pub mod resample;
pub mod source;
pub mod train;

pub use extract::{extract_table, run_extract, ExtractReport};
pub use features::*;
pub use labels::*;
pub use loader::*;
pub use postgres::PgSource;
pub use predict::{run_predict, score_frame, status_counts, PredictReport};
pub use resample::*;
pub use source::*;
pub use train::{run_train, train_model, TrainOutcome, TrainReport};
