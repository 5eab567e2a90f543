// Multi-class gradient boosting with a softmax objective
//
// Each round fits one regression tree per class against the softmax
// gradient (p - y) and hessian 2p(1 - p), all computed from the margins at
// the start of the round. Class probabilities are the softmax of the summed
// tree outputs.

use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::tree::{Tree, TreeParams};

const MIN_HESSIAN: f64 = 1e-16;

/// Hyperparameters, fixed per training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub lambda: f64,
    pub min_child_weight: f64,
    pub subsample: f64,
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.1,
            lambda: 1.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl From<&crate::config::TrainingConfig> for BoosterParams {
    fn from(config: &crate::config::TrainingConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            learning_rate: config.learning_rate,
            lambda: config.lambda,
            min_child_weight: config.min_child_weight,
            subsample: config.subsample,
            seed: config.seed,
        }
    }
}

impl BoosterParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
            lambda: self.lambda,
            min_child_weight: self.min_child_weight,
        }
    }
}

/// Fitted softmax booster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    num_classes: usize,
    num_features: usize,
    params: BoosterParams,
    /// rounds[r][k] is the tree for class k in round r
    rounds: Vec<Vec<Tree>>,
}

impl GradientBoostedClassifier {
    /// Fit on a dense feature matrix and encoded labels in `0..num_classes`
    pub fn fit(
        x: ArrayView2<'_, f64>,
        labels: &[usize],
        num_classes: usize,
        params: BoosterParams,
    ) -> Result<Self> {
        let n = x.nrows();
        if n == 0 {
            bail!("Cannot fit on an empty feature matrix");
        }
        if labels.len() != n {
            bail!("Label count {} does not match row count {}", labels.len(), n);
        }
        if num_classes < 2 {
            bail!("Need at least 2 classes to fit a classifier, got {num_classes}");
        }
        if let Some(bad) = labels.iter().find(|&&label| label >= num_classes) {
            bail!("Label {bad} out of range for {num_classes} classes");
        }

        let tree_params = params.tree_params();
        let mut rng = SmallRng::seed_from_u64(params.seed);
        let mut margins = Array2::<f64>::zeros((n, num_classes));
        let mut rounds = Vec::with_capacity(params.n_estimators);
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];

        for round in 0..params.n_estimators {
            let probabilities = softmax_rows(margins.view());
            let rows = sample_rows(n, params.subsample, &mut rng);
            let mut trees = Vec::with_capacity(num_classes);

            for class in 0..num_classes {
                for i in 0..n {
                    let p = probabilities[[i, class]];
                    let target = if labels[i] == class { 1.0 } else { 0.0 };
                    grad[i] = p - target;
                    hess[i] = (2.0 * p * (1.0 - p)).max(MIN_HESSIAN);
                }
                trees.push(Tree::fit(x, &grad, &hess, &rows, tree_params));
            }

            for (class, tree) in trees.iter().enumerate() {
                for i in 0..n {
                    margins[[i, class]] += tree.predict(x.row(i));
                }
            }
            rounds.push(trees);

            if round % 25 == 0 {
                tracing::trace!(round, "Boosting round complete");
            }
        }

        Ok(Self {
            num_classes,
            num_features: x.ncols(),
            params,
            rounds,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    pub fn num_trees(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }

    /// Raw per-class scores before softmax
    pub fn predict_margins(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        let mut margins = vec![0.0; self.num_classes];
        for trees in &self.rounds {
            for (class, tree) in trees.iter().enumerate() {
                margins[class] += tree.predict(row);
            }
        }
        margins
    }

    /// Class probabilities for one row; sums to 1
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        softmax(&self.predict_margins(ArrayView1::from(row)))
    }

    /// Most probable class; lowest index wins ties
    pub fn predict_class(&self, row: ArrayView1<'_, f64>) -> usize {
        argmax(&self.predict_margins(row))
    }

    /// Fraction of rows whose top-1 class matches the label
    pub fn score(&self, x: ArrayView2<'_, f64>, labels: &[usize]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let hits = labels
            .iter()
            .enumerate()
            .filter(|(i, &label)| self.predict_class(x.row(*i)) == label)
            .count();
        hits as f64 / labels.len() as f64
    }

    /// Total split gain per feature, normalised to sum to 1.
    ///
    /// A model without a single split spreads importance evenly.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.num_features];
        for tree in self.rounds.iter().flatten() {
            tree.accumulate_gain(&mut totals);
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter().map(|gain| gain / sum).collect()
        } else if self.num_features > 0 {
            vec![1.0 / self.num_features as f64; self.num_features]
        } else {
            totals
        }
    }
}

fn sample_rows(n: usize, subsample: f64, rng: &mut SmallRng) -> Vec<usize> {
    if subsample >= 1.0 {
        return (0..n).collect();
    }
    let amount = ((n as f64 * subsample).ceil() as usize).clamp(1, n);
    let mut rows = rand::seq::index::sample(rng, n, amount).into_vec();
    rows.sort_unstable();
    rows
}

fn softmax_rows(margins: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(margins.raw_dim());
    for (i, row) in margins.outer_iter().enumerate() {
        let probabilities = softmax(&row.to_vec());
        for (k, p) in probabilities.into_iter().enumerate() {
            out[[i, k]] = p;
        }
    }
    out
}

/// Numerically stable softmax
pub fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = i;
        }
    }
    best
}
