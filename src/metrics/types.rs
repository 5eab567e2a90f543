// Metrics data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a training payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingSource {
    Api,
    Synthetic,
    Cli,
}

/// One line of the training journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRun {
    pub timestamp: DateTime<Utc>,
    pub model_id: Uuid,
    pub source: TrainingSource,
    pub num_samples: usize,
    pub num_classes: usize,
    pub accuracy: f64,
    pub duration_ms: u64,
    /// SHA-256 of the canonical JSON of the training rows
    pub payload_sha256: String,
}

impl TrainingRun {
    pub fn new(
        model_id: Uuid,
        source: TrainingSource,
        num_samples: usize,
        num_classes: usize,
        accuracy: f64,
        duration_ms: u64,
        payload_sha256: String,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            model_id,
            source,
            num_samples,
            num_classes,
            accuracy,
            duration_ms,
            payload_sha256,
        }
    }
}

/// Point-in-time copy of the service counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub prediction_requests: u64,
    pub predictions_served: u64,
    pub training_runs: u64,
    pub training_failures: u64,
    pub avg_prediction_latency_ms: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime_secs: i64,
}
