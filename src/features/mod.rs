// Feature assembly
// Typed context records and the fixed-order rows fed to the classifier

mod assembler;
mod context;

pub use assembler::{assemble, canonical_feature_names, CALENDAR_FEATURES, FEATURE_NAMES};
pub use context::{
    ContextError, ContextRecord, ResolvedContext, StockItem, DEFAULT_AVAILABILITY_SCORE,
    DEFAULT_DAYS_TO_EXPIRY, DEFAULT_PLANNED_PORTIONS, DEFAULT_URGENCY_SCORE,
};
