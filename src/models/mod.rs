// Model layer
// Label encoding, the boosted classifier, and bundle persistence

pub mod bundle;
pub mod encoder;
pub mod gbdt;
pub mod store;

pub use bundle::ModelBundle;
pub use encoder::{LabelEncoder, RecipeId};
pub use gbdt::{BoosterParams, GradientBoostedClassifier};
pub use store::ModelStore;
