// Feature assembly - resolved context to a fixed-order numeric row
//
// The column order recorded in the model bundle is the contract: rows are
// always built against that list, never against FEATURE_NAMES directly.

use super::context::ResolvedContext;

/// Canonical feature columns, in training order
pub const FEATURE_NAMES: [&str; 11] = [
    "day_of_week",
    "month",
    "week_of_year",
    "planned_portions",
    "last_recipe_1",
    "last_recipe_2",
    "recipe_feasible",
    "availability_score",
    "min_days_to_expiry",
    "nb_missing_ingredients",
    "urgency_score",
];

/// Columns that have no default for historical rows
pub const CALENDAR_FEATURES: [&str; 3] = ["day_of_week", "month", "week_of_year"];

/// Owned copy of the canonical column list, as stored in a new bundle
pub fn canonical_feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}

/// Build one row in the exact order of `feature_names`.
///
/// Columns the assembler does not know are filled with 0.
pub fn assemble(context: &ResolvedContext, feature_names: &[String]) -> Vec<f64> {
    feature_names
        .iter()
        .map(|name| context.value(name).unwrap_or(0.0))
        .collect()
}
