//! Train/test partitioning and class rebalancing
//!
//! SMOTE oversamples the minority class by interpolating between neighbours;
//! Edited Nearest Neighbours then removes samples whose neighbourhood
//! disagrees with their label. Only the training partition is ever
//! resampled.

use std::fmt;

use linfa_nn::distance::L2Dist;
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour};
use log::warn;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{ChurnError, Result};

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded generator; the first `ceil(test_size * n)`
/// indices form the test partition, the rest the training partition.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<Split> {
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ChurnError::InvalidConfig(format!(
            "test size {} leaves an empty partition for {} samples",
            test_size, n
        )));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    Ok(Split {
        train,
        test: permutation,
    })
}

/// Label distribution: 0 = stayed, 1 = churned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub stayed: usize,
    pub churned: usize,
}

impl ClassCounts {
    pub fn from_labels(labels: &[u8]) -> Self {
        let churned = labels.iter().filter(|&&l| l == 1).count();
        Self {
            stayed: labels.len() - churned,
            churned,
        }
    }

    pub fn total(&self) -> usize {
        self.stayed + self.churned
    }

    /// Number of classes with at least one sample
    pub fn n_classes(&self) -> usize {
        usize::from(self.stayed > 0) + usize::from(self.churned > 0)
    }

    pub fn churn_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.churned as f64 / self.total() as f64
        }
    }
}

impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{0: {}, 1: {}}}", self.stayed, self.churned)
    }
}

/// For every row of `points`, the indices of its `k` nearest other rows.
///
/// Queries go through a `linfa-nn` k-d tree under Euclidean distance. `k` is
/// capped at `n - 1`; a row is never its own neighbour.
fn nearest_neighbours(points: &Array2<f64>, k: usize) -> Result<Vec<Vec<usize>>> {
    let n = points.nrows();
    let k = k.min(n.saturating_sub(1));
    if k == 0 {
        return Ok(vec![Vec::new(); n]);
    }

    let index = CommonNearestNeighbour::KdTree
        .from_batch(points, L2Dist)
        .map_err(|e| ChurnError::Model(format!("cannot index neighbours: {}", e)))?;

    points
        .outer_iter()
        .enumerate()
        .map(|(i, row)| -> Result<Vec<usize>> {
            let found = index
                .k_nearest(row, k + 1)
                .map_err(|e| ChurnError::Model(format!("neighbour query failed: {}", e)))?;
            Ok(found
                .into_iter()
                .map(|(_, j)| j)
                .filter(|&j| j != i)
                .take(k)
                .collect())
        })
        .collect()
}

/// Synthetic Minority Over-sampling Technique
#[derive(Debug, Clone)]
pub struct Smote {
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Grow the minority class to the size of the majority class.
    ///
    /// Synthetic rows are appended after the original rows. `k_neighbors` is
    /// capped at one less than the minority size; with fewer than two
    /// minority samples the input comes back unchanged.
    pub fn fit_resample(&self, x: &Array2<f64>, y: &[u8]) -> Result<(Array2<f64>, Vec<u8>)> {
        let mut out_x = x.clone();
        let mut out_y = y.to_vec();

        let counts = ClassCounts::from_labels(y);
        if counts.n_classes() < 2 || counts.stayed == counts.churned {
            return Ok((out_x, out_y));
        }

        let minority_label: u8 = if counts.churned < counts.stayed { 1 } else { 0 };
        let minority: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority_label).collect();
        let n_synthetic = counts.stayed.max(counts.churned) - minority.len();

        let k = self.k_neighbors.min(minority.len() - 1);
        if k == 0 {
            warn!(
                "SMOTE needs at least two minority samples, found {}; skipping oversampling",
                minority.len()
            );
            return Ok((out_x, out_y));
        }

        let points = x.select(Axis(0), &minority);
        let neighbours = nearest_neighbours(&points, k)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        for _ in 0..n_synthetic {
            let draw = rng.gen_range(0..minority.len() * k);
            let base = points.row(draw / k);
            let neighbour = points.row(neighbours[draw / k][draw % k]);
            let gap: f64 = rng.gen();

            let sample = &base + &((&neighbour - &base) * gap);
            out_x
                .push_row(sample.view())
                .map_err(|e| ChurnError::Model(format!("cannot append synthetic sample: {}", e)))?;
            out_y.push(minority_label);
        }

        Ok((out_x, out_y))
    }
}

/// Edited Nearest Neighbours cleaning applied to every class
#[derive(Debug, Clone)]
pub struct EditedNearestNeighbours {
    pub n_neighbors: usize,
}

impl EditedNearestNeighbours {
    pub fn new(n_neighbors: usize) -> Self {
        Self { n_neighbors }
    }

    /// Keep only the samples whose nearest neighbours all share their label
    pub fn fit_resample(&self, x: &Array2<f64>, y: &[u8]) -> Result<(Array2<f64>, Vec<u8>)> {
        if y.len() < 2 || self.n_neighbors == 0 {
            return Ok((x.clone(), y.to_vec()));
        }

        let neighbours = nearest_neighbours(x, self.n_neighbors)?;
        let keep: Vec<usize> = (0..y.len())
            .filter(|&i| neighbours[i].iter().all(|&j| y[j] == y[i]))
            .collect();

        let labels = keep.iter().map(|&i| y[i]).collect();
        Ok((x.select(Axis(0), &keep), labels))
    }
}

/// SMOTE oversampling followed by ENN cleaning
#[derive(Debug, Clone)]
pub struct SmoteEnn {
    pub smote: Smote,
    pub enn: EditedNearestNeighbours,
}

impl SmoteEnn {
    pub fn new(smote_neighbors: usize, enn_neighbors: usize, seed: u64) -> Self {
        Self {
            smote: Smote::new(smote_neighbors, seed),
            enn: EditedNearestNeighbours::new(enn_neighbors),
        }
    }

    pub fn fit_resample(&self, x: &Array2<f64>, y: &[u8]) -> Result<(Array2<f64>, Vec<u8>)> {
        let (x_over, y_over) = self.smote.fit_resample(x, y)?;
        self.enn.fit_resample(&x_over, &y_over)
    }
}
