// Project-wide constants
//
// Centralised here so port numbers and other magic values have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Default bind address for the HTTP service.
///
/// Port 5001 matches the port the kitchen back office calls by default.
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:5001";

/// Directory (relative to the working directory) holding the model bundle.
pub const DEFAULT_MODEL_DIR: &str = "model";

/// File name of the persisted model bundle inside the model directory.
pub const MODEL_FILE_NAME: &str = "model.json";

/// File name of the append-only training journal inside the model directory.
pub const TRAINING_JOURNAL_FILE_NAME: &str = "training_runs.jsonl";

/// Default request body cap (16 MiB). Training sets are posted inline.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Minimum number of labeled rows accepted by the trainer.
pub const DEFAULT_MIN_TRAINING_ROWS: usize = 10;

/// Number of predictions returned when the caller does not ask for a count.
pub const DEFAULT_NUM_PREDICTIONS: usize = 5;

/// Predictions at or below this probability are dropped.
pub const DEFAULT_MIN_PROBABILITY: f64 = 0.01;

/// Stock within this many days of expiry counts as urgent.
pub const DEFAULT_URGENT_EXPIRY_DAYS: f64 = 3.0;

/// Upper bound on synthetic rows per request; counts come straight off the wire.
pub const MAX_SYNTHETIC_COUNT: usize = 100_000;

/// Number of entries returned by the feature-importance endpoint.
pub const FEATURE_IMPORTANCE_TOP_N: usize = 15;

/// Version tag reported alongside predictions.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MEALCAST_CONFIG";

/// Environment variable overriding `server.bind_address`.
pub const BIND_ENV_VAR: &str = "MEALCAST_BIND";

/// Environment variable overriding `model.model_dir`.
pub const MODEL_DIR_ENV_VAR: &str = "MEALCAST_MODEL_DIR";
