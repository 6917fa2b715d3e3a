//! churnflow: customer churn pipeline
//!
//! Three stages that run one after another and share nothing but files:
//! extraction of a database table, training of a random forest with
//! SMOTE + ENN rebalancing, and batch scoring of the extracted rows.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{ChurnError, ErrorCategory, Result};
