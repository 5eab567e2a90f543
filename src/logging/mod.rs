// Logging setup
//
// One global tracing subscriber for the process. Filter comes from RUST_LOG
// when set, otherwise from the level passed on the command line.

use tracing_subscriber::EnvFilter;

/// Default directives when neither RUST_LOG nor `--log-level` is given
pub const DEFAULT_FILTER: &str = "mealcast=info,tower_http=info";

/// Build the env filter: RUST_LOG wins, then `level`, then the default.
pub fn build_filter(level: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    match level {
        Some(level) => EnvFilter::try_new(format!("mealcast={level},tower_http={level}"))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        None => EnvFilter::new(DEFAULT_FILTER),
    }
}

/// Install the fmt subscriber. Safe to call more than once (later calls are no-ops).
pub fn init(level: Option<&str>) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(true)
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
