//! Isolation Forest implementation
//!
//! Outliers are easier to isolate with random axis-aligned splits, so they
//! end up with shorter average path lengths across the trees. The decision
//! threshold is fitted from the training scores so that roughly the
//! configured contamination share of the training set is flagged.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Errors raised while fitting or scoring the forest
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("No training data")]
    EmptyData,

    #[error("Expected {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Non-finite feature value at row {0}")]
    NonFinite(usize),

    #[error("Contamination must be in (0, 0.5], got {0}")]
    InvalidContamination(f64),

    #[error("Model has not been fitted")]
    NotFitted,
}

/// Isolation Forest outlier detector
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    num_trees: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
    /// Sub-sample size actually used, after capping at the training size
    sample_size: usize,
    n_features: usize,
    /// Scores above this are outliers
    threshold: f64,
}

impl IsolationForest {
    /// Create an unfitted forest
    pub fn new(num_trees: usize, max_samples: usize, contamination: f64, seed: u64) -> Self {
        IsolationForest {
            trees: Vec::new(),
            num_trees: num_trees.max(1),
            max_samples: max_samples.max(2),
            contamination,
            seed,
            sample_size: 0,
            n_features: 0,
            threshold: f64::INFINITY,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fit the forest and its decision threshold
    pub fn fit(&mut self, data: &[Vec<f64>]) -> Result<(), ModelError> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ModelError::InvalidContamination(self.contamination));
        }
        let n_features = data.first().map(|row| row.len()).ok_or(ModelError::EmptyData)?;
        if n_features == 0 {
            return Err(ModelError::EmptyData);
        }
        Self::validate(data, n_features)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let sample_size = self.max_samples.min(data.len());
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        let mut trees = Vec::with_capacity(self.num_trees);
        for _ in 0..self.num_trees {
            let mut indices = rand::seq::index::sample(&mut rng, data.len(), sample_size).into_vec();
            let root = IsolationTree::build_node(data, &mut indices, n_features, 0, max_depth, &mut rng);
            trees.push(IsolationTree { root });
        }

        self.trees = trees;
        self.sample_size = sample_size;
        self.n_features = n_features;

        let scores = self.score_samples(data)?;
        self.threshold = quantile(&scores, 1.0 - self.contamination);
        Ok(())
    }

    /// Anomaly score in (0, 1] for each row; higher is more anomalous
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        Self::validate(data, self.n_features)?;

        let normalizer = average_path_length(self.sample_size);
        Ok(data
            .iter()
            .map(|row| {
                let total: f64 = self.trees.iter().map(|tree| tree.path_length(row)).sum();
                let mean_path = total / self.trees.len() as f64;
                if normalizer > 0.0 {
                    2.0_f64.powf(-mean_path / normalizer)
                } else {
                    0.5
                }
            })
            .collect())
    }

    /// Outlier flag for each row
    pub fn predict(&self, data: &[Vec<f64>]) -> Result<Vec<bool>, ModelError> {
        Ok(self
            .score_samples(data)?
            .into_iter()
            .map(|score| score > self.threshold)
            .collect())
    }

    fn validate(data: &[Vec<f64>], n_features: usize) -> Result<(), ModelError> {
        for (idx, row) in data.iter().enumerate() {
            if row.len() != n_features {
                return Err(ModelError::DimensionMismatch {
                    expected: n_features,
                    found: row.len(),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::NonFinite(idx));
            }
        }
        Ok(())
    }
}

/// Average path length of an unsuccessful BST search, c(n)
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + 0.5772156649) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linearly interpolated quantile, q in [0, 1]
fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::INFINITY;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// A single isolation tree
#[derive(Debug, Clone)]
struct IsolationTree {
    root: IsolationNode,
}

#[derive(Debug, Clone)]
enum IsolationNode {
    Internal {
        feature_idx: usize,
        split_value: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    Leaf {
        size: usize,
    },
}

impl IsolationTree {
    fn build_node(
        data: &[Vec<f64>],
        indices: &mut [usize],
        n_features: usize,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> IsolationNode {
        if depth >= max_depth || indices.len() <= 1 {
            return IsolationNode::Leaf { size: indices.len() };
        }

        // Only features that still vary can split this node
        let candidates: Vec<(usize, f64, f64)> = (0..n_features)
            .filter_map(|feature| {
                let (min, max) = indices.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &i| {
                    let v = data[i][feature];
                    (lo.min(v), hi.max(v))
                });
                (max > min).then_some((feature, min, max))
            })
            .collect();

        if candidates.is_empty() {
            return IsolationNode::Leaf { size: indices.len() };
        }

        let (feature_idx, min, max) = candidates[rng.gen_range(0..candidates.len())];
        let split_value = rng.gen_range(min..max);

        // Partition in place: values below the split go left
        let mut boundary = 0;
        for i in 0..indices.len() {
            if data[indices[i]][feature_idx] < split_value {
                indices.swap(i, boundary);
                boundary += 1;
            }
        }
        let (left_idx, right_idx) = indices.split_at_mut(boundary);

        let left = Self::build_node(data, left_idx, n_features, depth + 1, max_depth, rng);
        let right = Self::build_node(data, right_idx, n_features, depth + 1, max_depth, rng);

        IsolationNode::Internal {
            feature_idx,
            split_value,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn path_length(&self, sample: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                IsolationNode::Leaf { size } => return depth + average_path_length(*size),
                IsolationNode::Internal {
                    feature_idx,
                    split_value,
                    left,
                    right,
                } => {
                    node = if sample[*feature_idx] < *split_value { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}
