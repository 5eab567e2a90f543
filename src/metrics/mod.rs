// Metrics module
// Training journal and in-process service counters

mod counters;
mod journal;
mod types;

pub use counters::ServiceCounters;
pub use journal::TrainingJournal;
pub use types::{CounterSnapshot, TrainingRun, TrainingSource};
