// Status views of the loaded model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::{CounterSnapshot, TrainingRun};
use crate::models::{ModelBundle, RecipeId};
use crate::training::round4;

pub const MODEL_TYPE: &str = "GradientBoostedClassifier";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

impl FeatureImportance {
    /// Top `limit` features of `bundle`, importances rounded to 4 decimals
    pub fn ranked(bundle: &ModelBundle, limit: usize) -> Vec<Self> {
        bundle
            .ranked_importance()
            .into_iter()
            .take(limit)
            .map(|(feature, importance)| Self {
                feature,
                importance: round4(importance),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedStatus {
    pub trained: bool,
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub model_type: String,
    pub features_count: usize,
    pub feature_names: Vec<String>,
    pub classes_count: usize,
    pub classes: Vec<RecipeId>,
    pub feature_importance: Vec<FeatureImportance>,
    pub training_accuracy: f64,
    pub num_samples: usize,
    pub last_training: Option<TrainingRun>,
    pub counters: CounterSnapshot,
}

impl TrainedStatus {
    pub fn new(
        bundle: &ModelBundle,
        importance_limit: usize,
        last_training: Option<TrainingRun>,
        counters: CounterSnapshot,
    ) -> Self {
        Self {
            trained: true,
            model_id: bundle.model_id,
            trained_at: bundle.trained_at,
            model_type: MODEL_TYPE.to_string(),
            features_count: bundle.num_features(),
            feature_names: bundle.feature_names.clone(),
            classes_count: bundle.num_classes(),
            classes: bundle.label_encoder.classes().to_vec(),
            feature_importance: FeatureImportance::ranked(bundle, importance_limit),
            training_accuracy: round4(bundle.training_accuracy),
            num_samples: bundle.num_samples,
            last_training,
            counters,
        }
    }
}

/// `/status` body: the full view, or `{trained: false, message}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelStatus {
    Trained(Box<TrainedStatus>),
    NotTrained {
        trained: bool,
        message: String,
        counters: CounterSnapshot,
    },
}

impl ModelStatus {
    pub fn not_trained(counters: CounterSnapshot) -> Self {
        Self::NotTrained {
            trained: false,
            message: "No trained model".to_string(),
            counters,
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self, Self::Trained(_))
    }
}
