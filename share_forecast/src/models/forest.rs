//! Bagged regression trees
//!
//! Every tree is a CART regressor grown on a bootstrap sample of the training
//! rows, splitting on the threshold that minimises the summed squared error of
//! the two children. The forest predicts the mean of its trees.

use crate::error::{ForecastError, Result};
use crate::family::{FeatureVector, FEATURE_COUNT};
use crate::models::{ForecastModel, TrainedForecastModel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Ensemble configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Seed for bootstrap sampling; equal seeds give equal forests
    pub seed: u64,
    /// Maximum tree depth, unbounded when `None`
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Draw a bootstrap sample per tree instead of using every row
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_leaf must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Random forest regressor
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    name: String,
    params: ForestParams,
}

/// Fitted forest
#[derive(Debug, Clone)]
pub struct TrainedForest {
    name: String,
    trees: Vec<RegressionTree>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Single tree stored as a flat arena; node 0 is the root
#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
}

impl RandomForestRegressor {
    pub fn new(params: ForestParams) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            name: format!("Random Forest (n_estimators={})", params.n_estimators),
            params,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

impl ForecastModel for RandomForestRegressor {
    type Trained = TrainedForest;

    fn train(&self, features: &[FeatureVector], targets: &[f64]) -> Result<Self::Trained> {
        if features.is_empty() {
            return Err(ForecastError::Model(
                "Cannot fit a forest on zero rows".to_string(),
            ));
        }
        if features.len() != targets.len() {
            return Err(ForecastError::Model(format!(
                "Feature rows ({}) don't match targets ({})",
                features.len(),
                targets.len()
            )));
        }
        if features.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(ForecastError::Model(
                "Training data contains non-finite values".to_string(),
            ));
        }

        let n = features.len();
        let mut seeds = StdRng::seed_from_u64(self.params.seed);
        let trees = (0..self.params.n_estimators)
            .map(|_| {
                // each tree owns its stream so the fit order never matters
                let mut rng = StdRng::seed_from_u64(seeds.gen());
                let sample: Vec<usize> = if self.params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(features, targets, sample, &self.params)
            })
            .collect();

        Ok(TrainedForest {
            name: self.name.clone(),
            trees,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl TrainedForecastModel for TrainedForest {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>> {
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ForecastError::Model(
                "Prediction rows contain non-finite values".to_string(),
            ));
        }

        let n_trees = self.trees.len() as f64;
        Ok(rows
            .iter()
            .map(|row| self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl RegressionTree {
    fn fit(x: &[FeatureVector], y: &[f64], sample: Vec<usize>, params: &ForestParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, sample, 0, params);
        tree
    }

    fn grow(
        &mut self,
        x: &[FeatureVector],
        y: &[f64],
        sample: Vec<usize>,
        depth: usize,
        params: &ForestParams,
    ) -> usize {
        let value = mean(y, &sample);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        let at_limit = params.max_depth.is_some_and(|max| depth >= max)
            || sample.len() < params.min_samples_split;
        if at_limit {
            return id;
        }

        let Some(split) = best_split(x, y, &sample, value, params.min_samples_leaf) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left, depth + 1, params);
        let right = self.grow(x, y, right, depth + 1, params);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn predict(&self, row: &FeatureVector) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }
}

fn mean(y: &[f64], sample: &[usize]) -> f64 {
    sample.iter().map(|&i| y[i]).sum::<f64>() / sample.len() as f64
}

/// Lowest-error split honouring `min_leaf`, or `None` for a pure or unsplittable node.
/// Targets are centred on the node mean before accumulating squares.
fn best_split(
    x: &[FeatureVector],
    y: &[f64],
    sample: &[usize],
    node_mean: f64,
    min_leaf: usize,
) -> Option<Split> {
    let first = y[sample[0]];
    if sample.iter().all(|&i| y[i] == first) {
        return None;
    }

    let n = sample.len();
    let centred = |i: usize| y[i] - node_mean;
    let total_sum: f64 = sample.iter().map(|&i| centred(i)).sum();
    let total_sq: f64 = sample.iter().map(|&i| centred(i).powi(2)).sum();

    let mut order = sample.to_vec();
    let mut best: Option<(f64, Split)> = None;

    for feature in 0..FEATURE_COUNT {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for pos in 1..n {
            let prev = order[pos - 1];
            left_sum += centred(prev);
            left_sq += centred(prev).powi(2);

            let lo = x[prev][feature];
            let hi = x[order[pos]][feature];
            if lo == hi || pos < min_leaf || n - pos < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let score = (left_sq - left_sum * left_sum / pos as f64)
                + (right_sq - right_sum * right_sum / (n - pos) as f64);

            if best.as_ref().map_or(true, |(best_score, _)| score < *best_score) {
                let mid = lo + (hi - lo) / 2.0;
                let threshold = if mid < hi { mid } else { lo };
                best = Some((score, Split { feature, threshold }));
            }
        }
    }

    best.map(|(_, split)| split)
}
