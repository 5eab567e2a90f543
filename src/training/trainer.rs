// Trainer - labeled rows in, persisted model bundle out
//
// Validation happens before any fitting so a rejected request never touches
// the stored bundle. The bundle is persisted before it is handed back; the
// caller only swaps it into memory after the save succeeded.

use anyhow::Context;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

use crate::config::TrainingConfig;
use crate::errors::ServiceError;
use crate::features::{self, ContextRecord, CALENDAR_FEATURES};
use crate::models::{BoosterParams, GradientBoostedClassifier, LabelEncoder, ModelBundle, ModelStore, RecipeId};

/// One historical service: what was cooked, in which context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<RecipeId>,
    #[serde(flatten)]
    pub context: ContextRecord,
}

/// Validated, encoded training data
#[derive(Debug)]
pub struct PreparedData {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub labels: Vec<usize>,
    pub encoder: LabelEncoder,
}

/// Summary of a successful training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub model_id: Uuid,
    pub num_samples: usize,
    pub num_features: usize,
    pub num_classes: usize,
    /// Training-set top-1 accuracy, 4 decimals
    pub accuracy: f64,
    /// Most important first
    pub feature_importance: Vec<(String, f64)>,
    pub duration_ms: u64,
    pub model_path: PathBuf,
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub bundle: ModelBundle,
    pub report: TrainingReport,
}

#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Validate rows and build the feature matrix.
    ///
    /// Fails on too few rows, a row without `recipe_id`, out-of-range
    /// values, calendar columns no row supplies, or fewer than 2 recipes.
    pub fn prepare(&self, rows: &[TrainingRow]) -> Result<PreparedData, ServiceError> {
        if rows.len() < self.config.min_rows {
            return Err(ServiceError::validation(format!(
                "Not enough data to train (minimum {}, received {})",
                self.config.min_rows,
                rows.len()
            )));
        }

        let feature_names = features::canonical_feature_names();
        let mut data = Vec::with_capacity(rows.len() * feature_names.len());
        let mut labels = Vec::with_capacity(rows.len());
        let mut absent = [0usize; CALENDAR_FEATURES.len()];

        for (i, row) in rows.iter().enumerate() {
            let recipe_id = row
                .recipe_id
                .ok_or_else(|| ServiceError::validation(format!("Row {i}: missing recipe_id")))?;
            let (resolved, missing) = row
                .context
                .resolve_for_training()
                .map_err(|e| ServiceError::validation(format!("Row {i}: {e}")))?;

            for name in missing {
                if let Some(slot) = CALENDAR_FEATURES.iter().position(|c| *c == name) {
                    absent[slot] += 1;
                }
            }
            data.extend(features::assemble(&resolved, &feature_names));
            labels.push(recipe_id);
        }

        let missing_columns: Vec<&str> = CALENDAR_FEATURES
            .iter()
            .zip(absent)
            .filter(|(_, count)| *count == rows.len())
            .map(|(name, _)| *name)
            .collect();
        if !missing_columns.is_empty() {
            return Err(ServiceError::validation(format!(
                "Missing columns: {} (send a date or the calendar fields)",
                missing_columns.join(", ")
            )));
        }

        let (encoder, encoded) = LabelEncoder::fit_transform(&labels);
        if encoder.len() < 2 {
            return Err(ServiceError::validation(format!(
                "Need at least 2 distinct recipe ids to train, found {}",
                encoder.len()
            )));
        }

        let features = Array2::from_shape_vec((rows.len(), feature_names.len()), data)
            .context("Failed to build feature matrix")?;

        Ok(PreparedData {
            feature_names,
            features,
            labels: encoded,
            encoder,
        })
    }

    /// Validate, fit and score, without persisting
    pub fn fit(&self, rows: &[TrainingRow]) -> Result<ModelBundle, ServiceError> {
        let prepared = self.prepare(rows)?;
        let params = BoosterParams::from(&self.config);

        tracing::info!(
            samples = rows.len(),
            features = prepared.feature_names.len(),
            classes = prepared.encoder.len(),
            n_estimators = params.n_estimators,
            max_depth = params.max_depth,
            "Fitting classifier"
        );

        let classifier = GradientBoostedClassifier::fit(
            prepared.features.view(),
            &prepared.labels,
            prepared.encoder.len(),
            params,
        )
        .context("Classifier fit failed")?;

        let accuracy = classifier.score(prepared.features.view(), &prepared.labels);
        Ok(ModelBundle::new(
            prepared.feature_names,
            prepared.encoder,
            classifier,
            accuracy,
            rows.len(),
        ))
    }

    /// Full training run: fit, persist atomically, report
    pub fn train(
        &self,
        rows: &[TrainingRow],
        store: &ModelStore,
    ) -> Result<TrainingOutcome, ServiceError> {
        let started = Instant::now();
        let bundle = self.fit(rows)?;
        let model_path = store.save(&bundle)?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let report = TrainingReport {
            model_id: bundle.model_id,
            num_samples: bundle.num_samples,
            num_features: bundle.num_features(),
            num_classes: bundle.num_classes(),
            accuracy: round4(bundle.training_accuracy),
            feature_importance: bundle.ranked_importance(),
            duration_ms,
            model_path,
        };

        tracing::info!(
            model_id = %bundle.model_id,
            accuracy = report.accuracy,
            classes = report.num_classes,
            duration_ms,
            "Training complete"
        );
        Ok(TrainingOutcome { bundle, report })
    }
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
