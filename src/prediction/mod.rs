// Prediction
//
// Turns one resolved context into a ranked, thresholded list of recipes.
// Ranking is a stable sort on probability, so equal probabilities keep
// ascending class order (ascending recipe id).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::constants::MODEL_FORMAT_VERSION;
use crate::config::PredictionConfig;
use crate::features::{self, ResolvedContext};
use crate::models::{ModelBundle, RecipeId};
use crate::training::round4;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Coarse confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// >= 0.7 high, >= 0.4 medium, otherwise low
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.7 {
            Self::High
        } else if probability >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Catalogue entry used to name predicted recipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRef {
    pub id: RecipeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    /// Rounded to 4 decimals
    pub probability: f64,
    pub confidence: Confidence,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub version: u32,
    pub features_count: usize,
    pub model_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_predicted: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    pub predictions: Vec<Prediction>,
    pub model_info: ModelInfo,
}

#[derive(Debug, Clone)]
pub struct Predictor {
    config: PredictionConfig,
}

impl Predictor {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    /// Rank every known recipe for `context`; keep at most `count` (default
    /// from config when `None` or 0).
    pub fn predict(
        &self,
        bundle: &ModelBundle,
        context: &ResolvedContext,
        count: Option<usize>,
        recipes: &[RecipeRef],
    ) -> PredictionSet {
        let count = count
            .filter(|&n| n > 0)
            .unwrap_or(self.config.default_count);
        let row = features::assemble(context, &bundle.feature_names);
        let probabilities = bundle.classifier.predict_proba(&row);
        let reasons = reasons(context, self.config.urgent_expiry_days);

        let predictions: Vec<Prediction> = rank(&probabilities)
            .into_iter()
            .filter(|&(_, p)| p > self.config.min_probability)
            .filter_map(|(class, p)| {
                let recipe_id = bundle.label_encoder.inverse_transform(class)?;
                Some(Prediction {
                    recipe_id,
                    recipe_name: recipe_name(recipe_id, recipes),
                    probability: round4(p),
                    confidence: Confidence::from_probability(p),
                    reasons: reasons.clone(),
                })
            })
            .take(count)
            .collect();

        PredictionSet {
            predictions,
            model_info: ModelInfo {
                version: MODEL_FORMAT_VERSION,
                features_count: bundle.num_features(),
                model_id: bundle.model_id,
                date_predicted: context.date,
            },
        }
    }
}

/// (class index, probability), highest probability first, stable on ties
pub fn rank(probabilities: &[f64]) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Weekday phrase, plus an urgency phrase when stock is about to expire
pub fn reasons(context: &ResolvedContext, urgent_expiry_days: f64) -> Vec<String> {
    let day = (context.day_of_week.round() as usize).min(WEEKDAYS.len() - 1);
    let mut reasons = vec![format!("Suited for a {}", WEEKDAYS[day])];
    if context.has_urgent_stock(urgent_expiry_days) {
        reasons.push("Uses stock items close to expiry".to_string());
    }
    reasons
}

fn recipe_name(id: RecipeId, recipes: &[RecipeRef]) -> String {
    recipes
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| format!("Recipe #{id}"))
}
