//! Churn classifier: a bagged ensemble of `linfa-trees` decision trees

pub mod forest;

pub use forest::{balanced_class_weights, RandomForest};
