// RecommenderService - the single owner of the live model
//
// The bundle lives behind an Arc inside a tokio RwLock. Predictions clone the
// Arc and release the lock before doing any work; training fits on the
// blocking pool and only takes the write lock to swap the new bundle in.
// A prediction racing a training run sees either the old or the new bundle.

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::status::{FeatureImportance, ModelStatus, TrainedStatus};
use crate::config::constants::{FEATURE_IMPORTANCE_TOP_N, MAX_SYNTHETIC_COUNT};
use crate::config::Settings;
use crate::errors::ServiceError;
use crate::features::ContextRecord;
use crate::metrics::{ServiceCounters, TrainingJournal, TrainingRun, TrainingSource};
use crate::models::{ModelBundle, ModelStore, RecipeId};
use crate::prediction::{PredictionSet, Predictor, RecipeRef};
use crate::training::{synthetic, Trainer, TrainingReport, TrainingRow};

/// What the service currently holds in memory
#[derive(Debug, Clone)]
pub enum ModelState {
    Ready(Arc<ModelBundle>),
    NotTrained,
}

/// One prediction call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub context: ContextRecord,
    #[serde(default)]
    pub num_predictions: Option<usize>,
    /// Optional catalogue used to name the predicted recipes
    #[serde(default)]
    pub recipes: Vec<RecipeRef>,
}

pub struct RecommenderService {
    settings: Settings,
    store: ModelStore,
    journal: TrainingJournal,
    state: RwLock<ModelState>,
    counters: ServiceCounters,
}

impl RecommenderService {
    /// Open the model directory named in `settings`. Nothing is loaded yet.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let store = ModelStore::open(&settings.model.model_dir)?;
        let journal = TrainingJournal::new(settings.model.journal_path())?;
        Ok(Self {
            settings,
            store,
            journal,
            state: RwLock::new(ModelState::NotTrained),
            counters: ServiceCounters::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn journal(&self) -> &TrainingJournal {
        &self.journal
    }

    /// Whether a bundle is in memory right now; never touches disk
    pub async fn is_loaded(&self) -> bool {
        matches!(*self.state.read().await, ModelState::Ready(_))
    }

    /// Read the stored bundle on the blocking pool; no lock is held meanwhile
    async fn load_from_disk(&self) -> Result<Option<ModelBundle>, ServiceError> {
        let store = self.store.clone();
        let loaded = tokio::task::spawn_blocking(move || store.load())
            .await
            .context("Model load task did not complete")??;
        Ok(loaded)
    }

    /// Current bundle, loading it from disk on first use
    pub async fn ensure_loaded(&self) -> Result<Option<Arc<ModelBundle>>, ServiceError> {
        if let ModelState::Ready(bundle) = &*self.state.read().await {
            return Ok(Some(Arc::clone(bundle)));
        }

        let Some(loaded) = self.load_from_disk().await? else {
            return Ok(None);
        };

        let mut state = self.state.write().await;
        // A training run or another loader may have filled the slot meanwhile
        if let ModelState::Ready(bundle) = &*state {
            return Ok(Some(Arc::clone(bundle)));
        }
        let bundle = Arc::new(loaded);
        *state = ModelState::Ready(Arc::clone(&bundle));
        Ok(Some(bundle))
    }

    /// Re-read the bundle from disk, replacing whatever is in memory.
    /// Returns whether a model is loaded afterwards.
    pub async fn reload(&self) -> Result<bool, ServiceError> {
        let loaded = self.load_from_disk().await?;
        let mut state = self.state.write().await;
        *state = match loaded {
            Some(bundle) => {
                tracing::info!(model_id = %bundle.model_id, "Model reloaded");
                ModelState::Ready(Arc::new(bundle))
            }
            None => {
                tracing::info!(path = %self.store.model_path().display(), "No model on disk");
                ModelState::NotTrained
            }
        };
        Ok(matches!(*state, ModelState::Ready(_)))
    }

    /// Fit, persist, swap in and journal a new model
    pub async fn train(
        &self,
        rows: Vec<TrainingRow>,
        source: TrainingSource,
    ) -> Result<TrainingReport, ServiceError> {
        let result = self.train_inner(rows, source).await;
        self.counters.record_training(result.is_ok());
        result
    }

    async fn train_inner(
        &self,
        rows: Vec<TrainingRow>,
        source: TrainingSource,
    ) -> Result<TrainingReport, ServiceError> {
        let fingerprint = TrainingJournal::fingerprint(&rows)?;
        let trainer = Trainer::new(self.settings.training.clone());
        let store = self.store.clone();

        let outcome = tokio::task::spawn_blocking(move || trainer.train(&rows, &store))
            .await
            .context("Training task did not complete")??;

        let bundle = Arc::new(outcome.bundle);
        *self.state.write().await = ModelState::Ready(Arc::clone(&bundle));

        let run = TrainingRun::new(
            bundle.model_id,
            source,
            outcome.report.num_samples,
            outcome.report.num_classes,
            outcome.report.accuracy,
            outcome.report.duration_ms,
            fingerprint,
        );
        // The model is already saved and live; a journal failure only loses history
        if let Err(err) = self.journal.append(&run) {
            tracing::warn!(error = ?err, "Failed to journal training run");
        }

        Ok(outcome.report)
    }

    /// Generate seeded synthetic rows over `recipe_ids` and train on them
    pub async fn train_synthetic(
        &self,
        recipe_ids: &[RecipeId],
        count: usize,
        seed: u64,
        today: NaiveDate,
    ) -> Result<TrainingReport, ServiceError> {
        if count > MAX_SYNTHETIC_COUNT {
            return Err(ServiceError::validation(format!(
                "Synthetic count must be at most {MAX_SYNTHETIC_COUNT}, got {count}"
            )));
        }
        let rows = synthetic::generate(recipe_ids, count, seed, today)
            .map_err(|e| ServiceError::validation(e.to_string()))?;
        tracing::info!(count = rows.len(), recipes = recipe_ids.len(), seed, "Training on synthetic data");
        self.train(rows, TrainingSource::Synthetic).await
    }

    /// Rank recipes for one context. Calendar fields default to `today`.
    pub async fn predict(
        &self,
        request: PredictRequest,
        today: NaiveDate,
    ) -> Result<PredictionSet, ServiceError> {
        let started = Instant::now();
        let bundle = self.ensure_loaded().await?.ok_or(ServiceError::NotTrained)?;

        let context = request
            .context
            .resolve(today)
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let set = Predictor::new(self.settings.prediction.clone()).predict(
            &bundle,
            &context,
            request.num_predictions,
            &request.recipes,
        );

        self.counters
            .record_prediction(set.predictions.len(), started.elapsed().as_millis() as u64);
        tracing::debug!(
            model_id = %bundle.model_id,
            returned = set.predictions.len(),
            "Prediction served"
        );
        Ok(set)
    }

    pub async fn status(&self) -> Result<ModelStatus, ServiceError> {
        let counters = self.counters.snapshot();
        let Some(bundle) = self.ensure_loaded().await? else {
            return Ok(ModelStatus::not_trained(counters));
        };

        let last_training = self.journal.last_run().unwrap_or_else(|err| {
            tracing::warn!(error = ?err, "Could not read training journal");
            None
        });

        Ok(ModelStatus::Trained(Box::new(TrainedStatus::new(
            &bundle,
            bundle.num_features(),
            last_training,
            counters,
        ))))
    }

    /// Most important features first, capped at the top 15
    pub async fn feature_importance(&self) -> Result<Vec<FeatureImportance>, ServiceError> {
        let bundle = self.ensure_loaded().await?.ok_or(ServiceError::NotTrained)?;
        Ok(FeatureImportance::ranked(&bundle, FEATURE_IMPORTANCE_TOP_N))
    }
}
