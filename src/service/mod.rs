// Recommender service
// Owns the in-memory model bundle and every operation the HTTP layer exposes

mod recommender;
mod status;

pub use recommender::{ModelState, PredictRequest, RecommenderService};
pub use status::{FeatureImportance, ModelStatus, TrainedStatus};
