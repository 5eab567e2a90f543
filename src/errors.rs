// Request-scoped error taxonomy
//
// Everything below the HTTP boundary returns anyhow::Result; the service layer
// sorts failures into these three buckets so handlers can pick a status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failure of a single train / predict / info request
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Caller sent something unusable (missing recipe_id, too few rows, ...)
    #[error("{0}")]
    Validation(String),

    /// No bundle in memory and none on disk
    #[error("Model not trained. Train the model first.")]
    NotTrained,

    /// Anything else: I/O, serialization, booster failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NotTrained => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::NotTrained => json!({
                "success": false,
                "trained": false,
                "error": self.to_string(),
                "predictions": [],
            }),
            Self::Validation(message) => {
                tracing::warn!(error = %message, "Rejected request");
                json!({ "success": false, "error": message })
            }
            Self::Internal(err) => {
                tracing::error!(error = ?err, "Request failed");
                json!({ "success": false, "error": format!("{err:#}") })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::NotTrained.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServiceError::Internal(anyhow::anyhow!("disk on fire")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_keeps_context_chain() {
        let err: ServiceError = anyhow::anyhow!("root cause")
            .context("Failed to save model")
            .into();
        assert_eq!(err.to_string(), "Failed to save model");
        if let ServiceError::Internal(inner) = err {
            assert!(format!("{inner:#}").contains("root cause"));
        } else {
            panic!("expected internal error");
        }
    }
}
