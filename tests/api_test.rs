// Integration tests for the HTTP API
//
// Each test gets its own model directory, so tests never share a bundle.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mealcast::config::constants::MAX_SYNTHETIC_COUNT;
use mealcast::config::Settings;
use mealcast::server::create_router;
use mealcast::RecommenderService;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut settings = Settings::default();
        settings.model.model_dir = dir.path().to_path_buf();
        settings.training.n_estimators = 20;
        let service = Arc::new(RecommenderService::new(settings).expect("service"));
        Self {
            router: create_router(service),
            _dir: dir,
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("failed to build request");
        self.send(req).await
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.expect("oneshot failed");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .expect("failed to read body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

/// `n` rows cycling through `recipes`; recipe i is always served on weekday i
fn training_rows(n: usize, recipes: &[i64]) -> Value {
    // 2025-11-03 is a Monday
    let start = chrono::NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
    let rows: Vec<Value> = (0..n)
        .map(|i| {
            let slot = i % recipes.len();
            let date = start + chrono::Duration::days((slot + 7 * (i / recipes.len())) as i64);
            json!({
                "date": date.to_string(),
                "recipe_id": recipes[slot],
                "planned_portions": 40 + (i % 3) * 10,
                "last_recipes": [recipes[(slot + 1) % recipes.len()]],
            })
        })
        .collect();
    json!({ "training_data": rows })
}

// ---------------------------------------------------------------------------
// Health and empty state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_without_model() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "mealcast");
    assert_eq!(body["model_loaded"], false);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_predict_before_training() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/predict", json!({"context": {"day_of_week": 1}}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["trained"], false);
    assert_eq!(body["predictions"], json!([]));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_status_before_training() {
    let app = TestApp::new();
    let (status, body) = app.get("/model-info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trained"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_feature_importance_before_training() {
    let app = TestApp::new();
    let (status, body) = app.get("/feature-importance").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_train_ten_rows_three_recipes() {
    let app = TestApp::new();
    let (status, body) = app.post("/train", training_rows(10, &[1, 2, 3])).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["metrics"]["num_classes"], 3);
    assert_eq!(body["metrics"]["num_samples"], 10);
    assert_eq!(body["metrics"]["num_features"], 11);
    assert!(body["model_id"].is_string());
    assert!(body["feature_importance"].is_object());

    let (_, health) = app.get("/health").await;
    assert_eq!(health["model_loaded"], true);
}

#[tokio::test]
async fn test_train_rejects_too_few_rows() {
    let app = TestApp::new();
    let (status, body) = app.post("/train", training_rows(5, &[1, 2])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("minimum 10"));
}

#[tokio::test]
async fn test_train_rejects_missing_recipe_id() {
    let app = TestApp::new();
    let mut payload = training_rows(10, &[1, 2]);
    payload["training_data"][3]
        .as_object_mut()
        .unwrap()
        .remove("recipe_id");

    let (status, body) = app.post("/train", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Row 3: missing recipe_id");
}

#[tokio::test]
async fn test_train_rejects_malformed_json() {
    let app = TestApp::new();
    let req = Request::builder()
        .method("POST")
        .uri("/train")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = app.send(req).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_train_synthetic() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/train/synthetic", json!({"recipe_ids": [11, 12, 13], "count": 80}))
        .await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["metrics"]["num_samples"], 80);
}

#[tokio::test]
async fn test_train_synthetic_rejects_oversized_count() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/train/synthetic",
            json!({"recipe_ids": [1, 2], "count": 10_000_000_000u64}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("at most"));

    let (status, _) = app
        .post(
            "/train/synthetic",
            json!({"recipe_ids": [1, 2], "count": MAX_SYNTHETIC_COUNT + 1}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, health) = app.get("/health").await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["model_loaded"], false);
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_predict_is_bounded_by_class_count() {
    let app = TestApp::new();
    app.post("/train", training_rows(30, &[1, 2, 3])).await;

    let (status, body) = app
        .post(
            "/predict",
            json!({"context": {"date": "2025-11-24", "planned_portions": 50}, "num_predictions": 5}),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["success"], true);
    let predictions = body["predictions"].as_array().unwrap();
    assert!(!predictions.is_empty());
    assert!(predictions.len() <= 3);

    let probabilities: Vec<f64> = predictions
        .iter()
        .map(|p| p["probability"].as_f64().unwrap())
        .collect();
    assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!(probabilities.windows(2).all(|w| w[0] >= w[1]));
    for p in predictions {
        assert!(["high", "medium", "low"].contains(&p["confidence"].as_str().unwrap()));
        assert_eq!(p["reasons"][0], "Suited for a Monday");
    }

    assert_eq!(body["model_info"]["features_count"], 11);
    assert_eq!(body["model_info"]["date_predicted"], "2025-11-24");
}

#[tokio::test]
async fn test_predict_flat_body_matches_nested() {
    let app = TestApp::new();
    app.post("/train", training_rows(20, &[5, 6])).await;

    let (_, nested) = app
        .post(
            "/predict",
            json!({"context": {"day_of_week": 1, "month": 11, "week_of_year": 46}}),
        )
        .await;
    let (status, flat) = app
        .post(
            "/predict",
            json!({"day_of_week": 1, "month": 11, "week_of_year": 46}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(nested["predictions"], flat["predictions"]);
}

#[tokio::test]
async fn test_predict_flags_expiring_stock() {
    let app = TestApp::new();
    app.post("/train", training_rows(20, &[5, 6])).await;

    let (_, body) = app
        .post(
            "/predict",
            json!({
                "context": {
                    "date": "2025-11-28",
                    "stock": [{"product_id": 9, "available_qty": 3.0, "days_to_expiry": 1}]
                }
            }),
        )
        .await;

    let first = &body["predictions"][0];
    assert_eq!(first["reasons"][0], "Suited for a Friday");
    assert_eq!(first["reasons"][1], "Uses stock items close to expiry");
}

#[tokio::test]
async fn test_predict_rejects_out_of_range_context() {
    let app = TestApp::new();
    app.post("/train", training_rows(10, &[1, 2])).await;

    let (status, body) = app
        .post("/predict", json!({"context": {"month": 13}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_predict_is_repeatable() {
    let app = TestApp::new();
    app.post("/train", training_rows(15, &[1, 2, 3])).await;

    let request = json!({"context": {"date": "2025-11-26", "planned_portions": 45}});
    let (_, first) = app.post("/predict", request.clone()).await;
    let (_, second) = app.post("/predict", request).await;
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Model info, importance, reload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_status_after_training() {
    let app = TestApp::new();
    app.post("/train", training_rows(12, &[3, 1, 2])).await;

    let (status, body) = app.get("/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trained"], true);
    assert_eq!(body["classes"], json!([1, 2, 3]));
    assert_eq!(body["classes_count"], 3);
    assert_eq!(body["features_count"], 11);
    assert_eq!(body["feature_names"][0], "day_of_week");
    assert_eq!(body["last_training"]["num_samples"], 12);
    assert_eq!(body["counters"]["training_runs"], 1);
}

#[tokio::test]
async fn test_feature_importance_ranked() {
    let app = TestApp::new();
    app.post("/train", training_rows(21, &[1, 2, 3])).await;

    let (status, body) = app.get("/feature-importance").await;
    assert_eq!(status, StatusCode::OK);

    let ranked = body["feature_importance"].as_array().unwrap();
    assert!(!ranked.is_empty());
    assert!(ranked.len() <= 15);
    let values: Vec<f64> = ranked
        .iter()
        .map(|f| f["importance"].as_f64().unwrap())
        .collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_reload() {
    let app = TestApp::new();
    let (_, body) = app.post("/reload", json!({})).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["trained"], false);

    app.post("/train", training_rows(10, &[1, 2])).await;
    let (status, body) = app.post("/reload", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trained"], true);
}
