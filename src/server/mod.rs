// Mealcast - HTTP server module
// Routes, body limits and tracing around the recommender service

mod handlers;
pub mod types;

pub use handlers::{
    handle_feature_importance, handle_predict, handle_reload, handle_status, handle_train,
    handle_train_synthetic, health_check,
};

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::RecommenderService;

/// Build the application router around a shared service
pub fn create_router(service: Arc<RecommenderService>) -> Router {
    let config = service.settings().server.clone();

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/train", post(handle_train))
        .route("/train/synthetic", post(handle_train_synthetic))
        .route("/predict", post(handle_predict))
        .route("/status", get(handle_status))
        .route("/model-info", get(handle_status))
        .route("/feature-importance", get(handle_feature_importance))
        .route("/reload", post(handle_reload))
        .with_state(service)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    if config.cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Load any stored model, then serve until ctrl-c
pub async fn serve(service: Arc<RecommenderService>) -> Result<()> {
    let bind_address = service.settings().server.bind_address.clone();
    let addr: SocketAddr = bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {bind_address}"))?;

    match service.ensure_loaded().await {
        Ok(Some(bundle)) => tracing::info!(
            model_id = %bundle.model_id,
            classes = bundle.num_classes(),
            "Model ready"
        ),
        Ok(None) => tracing::warn!("No trained model yet; POST /train to create one"),
        Err(err) => tracing::error!(error = ?err, "Stored model could not be loaded"),
    }

    let app = create_router(service);

    tracing::info!("Starting mealcast server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?err, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
