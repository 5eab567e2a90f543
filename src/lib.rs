// Mealcast - recipe recommendation service
// Library exports

pub mod config;
pub mod errors;
pub mod features;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod prediction;
pub mod server;
pub mod service;
pub mod training;

pub use errors::ServiceError;
pub use service::RecommenderService;
