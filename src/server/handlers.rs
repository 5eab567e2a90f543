// HTTP handlers
//
// Thin adapters: decode the body, call the service, wrap the answer. Every
// failure is a ServiceError, which renders its own status and JSON body.

use axum::{extract::State, Json};
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::sync::Arc;

use super::types::{
    parse_predict_body, FeatureImportanceResponse, HealthResponse, PredictResponse,
    ReloadResponse, SyntheticTrainRequest, TrainRequest, TrainResponse,
};
use crate::errors::ServiceError;
use crate::metrics::TrainingSource;
use crate::service::{ModelStatus, RecommenderService};

type AppState = State<Arc<RecommenderService>>;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn health_check(State(service): AppState) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: service.is_loaded().await,
        timestamp: Local::now().to_rfc3339(),
    })
}

pub async fn handle_train(
    State(service): AppState,
    Json(request): Json<TrainRequest>,
) -> Result<Json<TrainResponse>, ServiceError> {
    tracing::info!(rows = request.training_data.len(), "Training request");
    let report = service
        .train(request.training_data, TrainingSource::Api)
        .await?;
    Ok(Json(report.into()))
}

pub async fn handle_train_synthetic(
    State(service): AppState,
    Json(request): Json<SyntheticTrainRequest>,
) -> Result<Json<TrainResponse>, ServiceError> {
    let report = service
        .train_synthetic(&request.recipe_ids, request.count, request.seed, today())
        .await?;
    Ok(Json(report.into()))
}

pub async fn handle_predict(
    State(service): AppState,
    Json(body): Json<Value>,
) -> Result<Json<PredictResponse>, ServiceError> {
    let request = parse_predict_body(body)?;
    let result = service.predict(request, today()).await?;
    Ok(Json(PredictResponse {
        success: true,
        result,
    }))
}

pub async fn handle_status(State(service): AppState) -> Result<Json<ModelStatus>, ServiceError> {
    Ok(Json(service.status().await?))
}

pub async fn handle_feature_importance(
    State(service): AppState,
) -> Result<Json<FeatureImportanceResponse>, ServiceError> {
    Ok(Json(FeatureImportanceResponse {
        feature_importance: service.feature_importance().await?,
    }))
}

pub async fn handle_reload(State(service): AppState) -> Result<Json<ReloadResponse>, ServiceError> {
    let trained = service.reload().await?;
    Ok(Json(ReloadResponse {
        success: true,
        trained,
    }))
}
