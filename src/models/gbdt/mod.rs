//! Gradient-boosted decision trees for multi-class recipe classification.
//!
//! - [`Tree`]: flat-array regression tree fitted to second-order gradients
//! - [`GradientBoostedClassifier`]: softmax booster, one tree per class per round
//!
//! Both serialize with serde so the fitted ensemble can live inside the
//! model bundle.

mod booster;
mod tree;

pub use booster::{softmax, BoosterParams, GradientBoostedClassifier};
pub use tree::{Node, Tree, TreeParams};
