// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::constants::*;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5001")
    pub bind_address: String,
    /// Allow cross-origin requests from any origin
    pub cors_enabled: bool,
    /// Maximum accepted request body in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_HTTP_ADDR.to_string(),
            cors_enabled: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Where the model bundle lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory created on startup if absent
    pub model_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
        }
    }
}

impl ModelConfig {
    /// Full path of the training journal
    pub fn journal_path(&self) -> PathBuf {
        self.model_dir.join(TRAINING_JOURNAL_FILE_NAME)
    }
}

/// Trainer configuration and booster hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Reject training sets smaller than this
    pub min_rows: usize,
    /// Boosting rounds (one tree per class per round)
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
    /// Minimum hessian sum in a child
    pub min_child_weight: f64,
    /// Fraction of rows sampled per round (1.0 = all rows)
    pub subsample: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_rows: DEFAULT_MIN_TRAINING_ROWS,
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

/// Ranking and thresholding policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Number of predictions when the request does not say
    pub default_count: usize,
    /// Predictions at or below this probability are dropped
    pub min_probability: f64,
    /// Stock expiring within this many days triggers the urgency reason
    pub urgent_expiry_days: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            default_count: DEFAULT_NUM_PREDICTIONS,
            min_probability: DEFAULT_MIN_PROBABILITY,
            urgent_expiry_days: DEFAULT_URGENT_EXPIRY_DAYS,
        }
    }
}

impl Settings {
    /// Reject values the trainer or predictor cannot work with
    pub fn validate(&self) -> Result<()> {
        let t = &self.training;
        if t.n_estimators == 0 {
            bail!("training.n_estimators must be at least 1");
        }
        if t.max_depth == 0 {
            bail!("training.max_depth must be at least 1");
        }
        if !(t.learning_rate > 0.0 && t.learning_rate <= 1.0) {
            bail!("training.learning_rate must be in (0, 1], got {}", t.learning_rate);
        }
        if t.lambda < 0.0 {
            bail!("training.lambda must be non-negative");
        }
        if !(t.subsample > 0.0 && t.subsample <= 1.0) {
            bail!("training.subsample must be in (0, 1], got {}", t.subsample);
        }
        if t.min_rows == 0 {
            bail!("training.min_rows must be at least 1");
        }

        let p = &self.prediction;
        if p.default_count == 0 {
            bail!("prediction.default_count must be at least 1");
        }
        if !(0.0..1.0).contains(&p.min_probability) {
            bail!("prediction.min_probability must be in [0, 1)");
        }

        if self.server.bind_address.trim().is_empty() {
            bail!("server.bind_address must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_hyperparameters() {
        let settings = Settings::default();
        assert_eq!(settings.training.n_estimators, 100);
        assert_eq!(settings.training.max_depth, 6);
        assert!((settings.training.learning_rate - 0.1).abs() < f64::EPSILON);
        assert_eq!(settings.training.seed, 42);
        assert_eq!(settings.training.min_rows, 10);
        assert_eq!(settings.prediction.default_count, 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_journal_path() {
        let config = ModelConfig {
            model_dir: PathBuf::from("/tmp/mc"),
        };
        assert_eq!(
            config.journal_path(),
            PathBuf::from("/tmp/mc/training_runs.jsonl")
        );
    }

    #[test]
    fn test_validate_rejects_bad_learning_rate() {
        let mut settings = Settings::default();
        settings.training.learning_rate = 0.0;
        assert!(settings.validate().is_err());

        settings.training.learning_rate = 0.3;
        settings.training.subsample = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [training]
            n_estimators = 20

            [prediction]
            min_probability = 0.0
            "#,
        )
        .unwrap();

        assert_eq!(settings.training.n_estimators, 20);
        assert_eq!(settings.training.max_depth, 6);
        assert_eq!(settings.prediction.min_probability, 0.0);
        assert_eq!(settings.server.bind_address, DEFAULT_HTTP_ADDR);
    }
}
