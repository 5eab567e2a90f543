// Service counters - lock-free tallies of what this process has served

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::CounterSnapshot;

#[derive(Debug)]
pub struct ServiceCounters {
    prediction_requests: AtomicU64,
    predictions_served: AtomicU64,
    prediction_latency_ms: AtomicU64,
    training_runs: AtomicU64,
    training_failures: AtomicU64,
    started_at: DateTime<Utc>,
}

impl Default for ServiceCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceCounters {
    pub fn new() -> Self {
        Self {
            prediction_requests: AtomicU64::new(0),
            predictions_served: AtomicU64::new(0),
            prediction_latency_ms: AtomicU64::new(0),
            training_runs: AtomicU64::new(0),
            training_failures: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    /// Record an answered prediction request returning `served` recipes
    pub fn record_prediction(&self, served: usize, latency_ms: u64) {
        self.prediction_requests.fetch_add(1, Ordering::Relaxed);
        self.predictions_served
            .fetch_add(served as u64, Ordering::Relaxed);
        self.prediction_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_training(&self, succeeded: bool) {
        if succeeded {
            self.training_runs.fetch_add(1, Ordering::Relaxed);
        } else {
            self.training_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let requests = self.prediction_requests.load(Ordering::Relaxed);
        let latency = self.prediction_latency_ms.load(Ordering::Relaxed);
        CounterSnapshot {
            prediction_requests: requests,
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            training_runs: self.training_runs.load(Ordering::Relaxed),
            training_failures: self.training_failures.load(Ordering::Relaxed),
            avg_prediction_latency_ms: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
            started_at: Some(self.started_at),
            uptime_secs: (Utc::now() - self.started_at).num_seconds(),
        }
    }
}
