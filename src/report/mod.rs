//! Report module - evaluation metrics and stage summaries

pub mod metrics;
pub mod summary;

pub use metrics::*;
pub use summary::*;
