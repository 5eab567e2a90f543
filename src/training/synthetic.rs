// Synthetic training data
//
// Used to bootstrap a model when the kitchen has too little history. Rows are
// dated over the last 180 days with a mild weekday pattern: Mondays lean
// towards the first recipe and Fridays towards the second, so a freshly
// trained model has something to find.

use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::trainer::TrainingRow;
use crate::config::constants::MAX_SYNTHETIC_COUNT;
use crate::features::ContextRecord;
use crate::models::RecipeId;

pub const DEFAULT_SYNTHETIC_COUNT: usize = 100;
pub const DEFAULT_SYNTHETIC_SEED: u64 = 42;
const HISTORY_DAYS: i64 = 180;

/// Generate `count` seeded rows over `recipe_ids`, dated up to 180 days before `today`
pub fn generate(
    recipe_ids: &[RecipeId],
    count: usize,
    seed: u64,
    today: NaiveDate,
) -> Result<Vec<TrainingRow>> {
    if recipe_ids.is_empty() {
        bail!("No recipes to generate training data for");
    }
    if count > MAX_SYNTHETIC_COUNT {
        bail!("Synthetic count must be at most {MAX_SYNTHETIC_COUNT}, got {count}");
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let second = recipe_ids[1.min(recipe_ids.len() - 1)];
    let mut rows = Vec::new();

    for _ in 0..count {
        let date = today - Duration::days(rng.gen_range(0..HISTORY_DAYS));
        let pick = |rng: &mut SmallRng| *recipe_ids.choose(rng).unwrap_or(&recipe_ids[0]);

        let recipe_id = match date.weekday() {
            Weekday::Mon if rng.gen_bool(0.5) => recipe_ids[0],
            Weekday::Fri if rng.gen_bool(0.5) => second,
            _ => pick(&mut rng),
        };
        let last_recipes = vec![pick(&mut rng), pick(&mut rng)];

        rows.push(TrainingRow {
            recipe_id: Some(recipe_id),
            context: ContextRecord {
                date: Some(date),
                planned_portions: Some(f64::from(rng.gen_range(20u32..70))),
                last_recipes: Some(last_recipes),
                recipe_feasible: Some(1.0),
                availability_score: Some(rng.gen_range(0.5..=1.0)),
                min_days_to_expiry: Some(f64::from(rng.gen_range(1u32..=14))),
                nb_missing_ingredients: Some(0.0),
                urgency_score: Some(rng.gen_range(0.0..=1.0)),
                ..Default::default()
            },
        });
    }

    tracing::debug!(count, recipes = recipe_ids.len(), seed, "Generated synthetic rows");
    Ok(rows)
}
