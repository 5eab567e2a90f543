// Model bundle - everything inference needs, persisted as one unit
//
// The feature name list is the column-order contract between training and
// inference: rows are always assembled against it.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::encoder::LabelEncoder;
use super::gbdt::GradientBoostedClassifier;
use crate::config::constants::MODEL_FORMAT_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    /// Fresh for every successful training run
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    /// Ordered feature columns the classifier was fitted on
    pub feature_names: Vec<String>,
    pub label_encoder: LabelEncoder,
    pub classifier: GradientBoostedClassifier,
    /// Normalised gain importance, aligned with `feature_names`
    pub feature_importance: Vec<f64>,
    /// Training-set top-1 accuracy
    pub training_accuracy: f64,
    pub num_samples: usize,
}

impl ModelBundle {
    pub fn new(
        feature_names: Vec<String>,
        label_encoder: LabelEncoder,
        classifier: GradientBoostedClassifier,
        training_accuracy: f64,
        num_samples: usize,
    ) -> Self {
        let feature_importance = classifier.feature_importances();
        Self {
            format_version: MODEL_FORMAT_VERSION,
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            feature_names,
            label_encoder,
            classifier,
            feature_importance,
            training_accuracy,
            num_samples,
        }
    }

    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn num_classes(&self) -> usize {
        self.label_encoder.len()
    }

    /// (feature, importance) pairs, most important first.
    /// Equal importances keep column order.
    pub fn ranked_importance(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.feature_importance.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Internal consistency: column count, class count, importance width
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            bail!(
                "Unsupported model format version {} (expected {})",
                self.format_version,
                MODEL_FORMAT_VERSION
            );
        }
        if self.feature_names.len() != self.classifier.num_features() {
            bail!(
                "Bundle lists {} features but the classifier was fitted on {}",
                self.feature_names.len(),
                self.classifier.num_features()
            );
        }
        if self.label_encoder.len() != self.classifier.num_classes() {
            bail!(
                "Label encoder has {} classes but the classifier has {}",
                self.label_encoder.len(),
                self.classifier.num_classes()
            );
        }
        if self.feature_importance.len() != self.feature_names.len() {
            bail!("Feature importance width does not match feature names");
        }
        Ok(())
    }
}
