//! Random forest classifier
//!
//! Each member is a `linfa-trees` Gini tree fitted on a bootstrap sample of
//! the rows and a random subset of the feature columns. Bootstrap counts and
//! class weights reach the tree as `linfa` dataset weights. The fitted forest
//! serializes to JSON as-is; the ordered feature names it was fitted on travel
//! with it.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use linfa::prelude::*;
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{ClassWeight, ForestConfig};
use crate::error::{ChurnError, Result};

/// One tree and the feature columns it was fitted on
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Member {
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

impl Member {
    fn votes(&self, x: &Array2<f64>) -> Array1<usize> {
        let columns = x.select(Axis(1), &self.features);
        self.tree.predict(&columns)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    feature_names: Vec<String>,
    class_weights: [f64; 2],
    members: Vec<Member>,
}

impl RandomForest {
    /// Fit `config.n_trees` trees on bootstrap samples of `(x, y)`.
    ///
    /// Labels must be 0 or 1. Each tree sees `max(1, floor(sqrt(p)))` of the
    /// `p` feature columns. Every tree draws its seed from a generator seeded
    /// with `config.seed`, so identical inputs give identical forests.
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        feature_names: Vec<String>,
        config: &ForestConfig,
    ) -> Result<Self> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ChurnError::Model("cannot fit a forest on an empty matrix".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(ChurnError::Model(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if feature_names.len() != x.ncols() {
            return Err(ChurnError::Model(format!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                x.ncols()
            )));
        }
        if let Some(bad) = y.iter().find(|&&label| label > 1) {
            return Err(ChurnError::Model(format!("label {} is not binary", bad)));
        }

        let class_weights = match config.class_weight {
            ClassWeight::Uniform => [1.0, 1.0],
            ClassWeight::Balanced => balanced_class_weights(y),
        };
        // Scaled so the lighter class weighs 1 and a leaf of one sample
        // always meets the tree's minimum leaf weight
        let lightest = class_weights[0].min(class_weights[1]);
        let sample_weights = class_weights.map(|w| (w / lightest) as f32);

        let params = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(Some(config.max_depth))
            .min_weight_split(config.min_samples_split.max(2) as f32)
            .min_weight_leaf(1.0);

        let n = x.nrows();
        let p = x.ncols();
        let per_tree = ((p as f64).sqrt().floor() as usize).clamp(1, p);
        let mut seeder = StdRng::seed_from_u64(config.seed);
        let mut members = Vec::with_capacity(config.n_trees);

        for _ in 0..config.n_trees {
            let mut rng = StdRng::seed_from_u64(seeder.gen::<u64>());

            let mut draws = vec![0u32; n];
            for _ in 0..n {
                draws[rng.gen_range(0..n)] += 1;
            }
            let rows: Vec<usize> = (0..n).filter(|&i| draws[i] > 0).collect();

            let mut features = index::sample(&mut rng, p, per_tree).into_vec();
            features.sort_unstable();

            let records = x.select(Axis(0), &rows).select(Axis(1), &features);
            let targets: Array1<usize> = rows.iter().map(|&i| y[i] as usize).collect();
            let weights: Array1<f32> = rows
                .iter()
                .map(|&i| draws[i] as f32 * sample_weights[y[i] as usize])
                .collect();

            let dataset = Dataset::new(records, targets).with_weights(weights);
            let tree = params
                .fit(&dataset)
                .map_err(|e| ChurnError::Model(format!("tree fit failed: {}", e)))?;

            members.push(Member { features, tree });
        }

        Ok(Self {
            feature_names,
            class_weights,
            members,
        })
    }

    /// Trees voting for class 1, per row
    fn churn_votes(&self, x: &Array2<f64>) -> Array1<usize> {
        let mut votes = Array1::zeros(x.nrows());
        for member in &self.members {
            votes += &member.votes(x);
        }
        votes
    }

    /// Share of trees voting for class 1, per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        let n_trees = self.members.len().max(1) as f64;
        self.churn_votes(x)
            .iter()
            .map(|&v| v as f64 / n_trees)
            .collect()
    }

    /// Majority vote for every row; ties go to class 0
    pub fn predict(&self, x: &Array2<f64>) -> Vec<u8> {
        let n_trees = self.members.len();
        self.churn_votes(x)
            .iter()
            .map(|&v| u8::from(2 * v > n_trees))
            .collect()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn class_weights(&self) -> [f64; 2] {
        self.class_weights
    }

    pub fn n_trees(&self) -> usize {
        self.members.len()
    }

    /// Write the forest as JSON, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ChurnError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| ChurnError::io(path, e))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChurnError::FileMissing {
                kind: "Model",
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| ChurnError::io(path, e))?;
        let forest: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(forest)
    }
}

/// `n_samples / (n_classes * count)` for each class present in `y`
pub fn balanced_class_weights(y: &[u8]) -> [f64; 2] {
    let mut counts = [0usize; 2];
    for &label in y {
        counts[label as usize] += 1;
    }
    let present = counts.iter().filter(|&&c| c > 0).count().max(1) as f64;
    let n = y.len() as f64;

    let mut weights = [1.0; 2];
    for (weight, &count) in weights.iter_mut().zip(&counts) {
        if count > 0 {
            *weight = n / (present * count as f64);
        }
    }
    weights
}
