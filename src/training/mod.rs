// Training
// Row validation, classifier fitting, bundle persistence and synthetic data

pub mod synthetic;
mod trainer;

pub use trainer::{PreparedData, Trainer, TrainingOutcome, TrainingReport, TrainingRow};

#[cfg(test)]
pub(crate) use trainer::fixtures;
pub(crate) use trainer::round4;
