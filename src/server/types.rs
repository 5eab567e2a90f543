// Request and response bodies for the HTTP API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::features::ContextRecord;
use crate::models::RecipeId;
use crate::prediction::{PredictionSet, RecipeRef};
use crate::service::{FeatureImportance, PredictRequest};
use crate::training::synthetic::{DEFAULT_SYNTHETIC_COUNT, DEFAULT_SYNTHETIC_SEED};
use crate::training::{round4, TrainingReport, TrainingRow};

#[derive(Debug, Clone, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub training_data: Vec<TrainingRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyntheticTrainRequest {
    pub recipe_ids: Vec<RecipeId>,
    #[serde(default = "default_synthetic_count")]
    pub count: usize,
    #[serde(default = "default_synthetic_seed")]
    pub seed: u64,
}

fn default_synthetic_count() -> usize {
    DEFAULT_SYNTHETIC_COUNT
}

fn default_synthetic_seed() -> u64 {
    DEFAULT_SYNTHETIC_SEED
}

/// Flat predict body: context fields at the top level
#[derive(Debug, Deserialize)]
struct FlatPredictBody {
    #[serde(flatten)]
    context: ContextRecord,
    #[serde(default)]
    num_predictions: Option<usize>,
    #[serde(default)]
    recipes: Vec<RecipeRef>,
}

/// Accept `{context: {...}, num_predictions, recipes}` or the same fields
/// with the context spread at the top level.
pub fn parse_predict_body(body: Value) -> Result<PredictRequest, ServiceError> {
    let invalid = |e: serde_json::Error| ServiceError::validation(format!("Invalid predict body: {e}"));

    if !body.is_object() {
        return Err(ServiceError::validation("Predict body must be a JSON object"));
    }
    if body.get("context").is_some() {
        return serde_json::from_value(body).map_err(invalid);
    }

    let flat: FlatPredictBody = serde_json::from_value(body).map_err(invalid)?;
    Ok(PredictRequest {
        context: flat.context,
        num_predictions: flat.num_predictions,
        recipes: flat.recipes,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainMetrics {
    pub accuracy: f64,
    pub num_samples: usize,
    pub num_features: usize,
    pub num_classes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    pub success: bool,
    pub message: String,
    pub metrics: TrainMetrics,
    /// feature -> importance, most important first
    pub feature_importance: Map<String, Value>,
    pub model_id: Uuid,
    pub model_path: String,
    pub duration_ms: u64,
}

impl From<TrainingReport> for TrainResponse {
    fn from(report: TrainingReport) -> Self {
        let feature_importance = report
            .feature_importance
            .into_iter()
            .map(|(name, importance)| (name, Value::from(round4(importance))))
            .collect();

        Self {
            success: true,
            message: "Model trained successfully".to_string(),
            metrics: TrainMetrics {
                accuracy: report.accuracy,
                num_samples: report.num_samples,
                num_features: report.num_features,
                num_classes: report.num_classes,
            },
            feature_importance,
            model_id: report.model_id,
            model_path: report.model_path.display().to_string(),
            duration_ms: report.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: PredictionSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportanceResponse {
    pub feature_importance: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub trained: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_predict_body() {
        let request = parse_predict_body(json!({
            "context": {"day_of_week": 2, "planned_portions": 45},
            "num_predictions": 3,
            "recipes": [{"id": 7, "name": "Ratatouille"}]
        }))
        .unwrap();
        assert_eq!(request.context.day_of_week, Some(2.0));
        assert_eq!(request.num_predictions, Some(3));
        assert_eq!(request.recipes.len(), 1);
    }

    #[test]
    fn test_flat_predict_body() {
        let request = parse_predict_body(json!({
            "date": "2025-11-28",
            "planned_portions": 60,
            "stock": [{"product_id": 1, "available_qty": 4, "days_to_expiry": 1}],
            "num_predictions": 2
        }))
        .unwrap();
        assert!(request.context.date.is_some());
        assert_eq!(request.context.planned_portions, Some(60.0));
        assert_eq!(request.num_predictions, Some(2));
    }

    #[test]
    fn test_empty_body_is_all_defaults() {
        let request = parse_predict_body(json!({})).unwrap();
        assert_eq!(request, PredictRequest::default());
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        let err = parse_predict_body(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_synthetic_defaults() {
        let request: SyntheticTrainRequest =
            serde_json::from_value(json!({"recipe_ids": [1, 2]})).unwrap();
        assert_eq!(request.count, DEFAULT_SYNTHETIC_COUNT);
        assert_eq!(request.seed, DEFAULT_SYNTHETIC_SEED);
    }
}
