// Regression tree for second-order boosting
//
// Nodes live in a flat Vec; index 0 is the root. Rows with
// `x[feature] < threshold` go left. Leaf values already include the
// learning rate, so a prediction is a plain sum over trees.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// A node in a fitted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Loss reduction achieved by this split
        gain: f64,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

/// Knobs the tree builder needs from the booster
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub lambda: f64,
    pub min_child_weight: f64,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl Tree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Fit one tree to per-row gradients and hessians over `rows`
    pub fn fit(
        x: ArrayView2<'_, f64>,
        grad: &[f64],
        hess: &[f64],
        rows: &[usize],
        params: TreeParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, grad, hess, rows.to_vec(), 0, params);
        tree
    }

    fn grow(
        &mut self,
        x: ArrayView2<'_, f64>,
        grad: &[f64],
        hess: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: TreeParams,
    ) -> usize {
        let index = self.nodes.len();
        let (g, h) = sums(grad, hess, &rows);
        self.nodes.push(Node::Leaf {
            value: leaf_weight(g, h, params),
        });

        if depth >= params.max_depth || rows.len() < 2 {
            return index;
        }
        let Some(split) = best_split(x, grad, hess, &rows, g, h, params) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| x[[r, split.feature]] < split.threshold);

        let left = self.grow(x, grad, hess, left_rows, depth + 1, params);
        let right = self.grow(x, grad, hess, right_rows, depth + 1, params);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            gain: split.gain,
        };
        index
    }

    /// Output of this tree for one feature row
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value < *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Add each split's gain to `totals[feature]`
    pub fn accumulate_gain(&self, totals: &mut [f64]) {
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                if let Some(total) = totals.get_mut(*feature) {
                    *total += gain;
                }
            }
        }
    }

    /// Longest root-to-leaf path, counted in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

fn sums(grad: &[f64], hess: &[f64], rows: &[usize]) -> (f64, f64) {
    rows.iter()
        .fold((0.0, 0.0), |(g, h), &r| (g + grad[r], h + hess[r]))
}

fn leaf_weight(g: f64, h: f64, params: TreeParams) -> f64 {
    -g / (h + params.lambda) * params.learning_rate
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

/// Exact greedy search over every feature and every boundary between
/// distinct sorted values. The first best candidate wins ties.
fn best_split(
    x: ArrayView2<'_, f64>,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    g_total: f64,
    h_total: f64,
    params: TreeParams,
) -> Option<SplitCandidate> {
    let parent = score(g_total, h_total, params.lambda);
    let mut best: Option<SplitCandidate> = None;
    let mut order = rows.to_vec();

    for feature in 0..x.ncols() {
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let (mut g_left, mut h_left) = (0.0, 0.0);
        for pair in order.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            g_left += grad[current];
            h_left += hess[current];

            let (value, next_value) = (x[[current, feature]], x[[next, feature]]);
            if value == next_value {
                continue;
            }
            let h_right = h_total - h_left;
            if h_left < params.min_child_weight || h_right < params.min_child_weight {
                continue;
            }

            let g_right = g_total - g_left;
            let gain = 0.5
                * (score(g_left, h_left, params.lambda) + score(g_right, h_right, params.lambda)
                    - parent);
            if gain <= 1e-12 || best.as_ref().is_some_and(|b| gain <= b.gain) {
                continue;
            }

            let mut threshold = value + (next_value - value) / 2.0;
            if threshold <= value {
                threshold = next_value;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                gain,
            });
        }
    }
    best
}
