// Context record - the situational input to a prediction or a training row
//
// Every recognised field is optional on the wire. Resolution fills each one
// from (1) the explicit value, (2) a value derived from `date`,
// `last_recipes` or `stock`, (3) the documented default.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PLANNED_PORTIONS: f64 = 50.0;
pub const DEFAULT_RECIPE_FEASIBLE: f64 = 1.0;
pub const DEFAULT_AVAILABILITY_SCORE: f64 = 1.0;
pub const DEFAULT_DAYS_TO_EXPIRY: f64 = 30.0;
pub const DEFAULT_URGENCY_SCORE: f64 = 0.5;

/// One product line in the kitchen stock snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub product_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default)]
    pub available_qty: f64,
    #[serde(default = "default_days_to_expiry")]
    pub days_to_expiry: f64,
}

fn default_days_to_expiry() -> f64 {
    DEFAULT_DAYS_TO_EXPIRY
}

/// Raw context as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextRecord {
    /// Service date; derives the calendar fields when they are absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// 0 = Monday ... 6 = Sunday
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<f64>,
    /// ISO week number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_of_year: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_portions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_recipe_1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_recipe_2: Option<f64>,
    /// Most recent first; fills `last_recipe_1` / `last_recipe_2`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_recipes: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_feasible: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_days_to_expiry: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_missing_ingredients: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<Vec<StockItem>>,
}

/// A context value outside its documented domain
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field} out of range: {value} (expected {expected})")]
pub struct ContextError {
    pub field: &'static str,
    pub value: f64,
    pub expected: &'static str,
}

/// Fully populated context: every feature has a concrete value
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext {
    pub date: Option<NaiveDate>,
    pub day_of_week: f64,
    pub month: f64,
    pub week_of_year: f64,
    pub planned_portions: f64,
    pub last_recipe_1: f64,
    pub last_recipe_2: f64,
    pub recipe_feasible: f64,
    pub availability_score: f64,
    pub min_days_to_expiry: f64,
    pub nb_missing_ingredients: f64,
    pub urgency_score: f64,
    /// Soonest expiry across the stock snapshot, if one was sent
    pub soonest_stock_expiry: Option<f64>,
}

impl ResolvedContext {
    /// Look a feature up by its column name
    pub fn value(&self, name: &str) -> Option<f64> {
        let value = match name {
            "day_of_week" => self.day_of_week,
            "month" => self.month,
            "week_of_year" => self.week_of_year,
            "planned_portions" => self.planned_portions,
            "last_recipe_1" => self.last_recipe_1,
            "last_recipe_2" => self.last_recipe_2,
            "recipe_feasible" => self.recipe_feasible,
            "availability_score" => self.availability_score,
            "min_days_to_expiry" => self.min_days_to_expiry,
            "nb_missing_ingredients" => self.nb_missing_ingredients,
            "urgency_score" => self.urgency_score,
            _ => return None,
        };
        Some(value)
    }

    /// True when anything in the context expires within `days`
    pub fn has_urgent_stock(&self, days: f64) -> bool {
        self.min_days_to_expiry <= days
            || self.soonest_stock_expiry.is_some_and(|d| d <= days)
    }
}

/// Calendar fields resolved from explicit values and the date
struct Calendar {
    day_of_week: Option<f64>,
    month: Option<f64>,
    week_of_year: Option<f64>,
}

impl Calendar {
    fn from_date(date: NaiveDate) -> (f64, f64, f64) {
        (
            f64::from(date.weekday().num_days_from_monday()),
            f64::from(date.month()),
            f64::from(date.iso_week().week()),
        )
    }
}

impl ContextRecord {
    /// Resolve for inference. Calendar fields nobody supplied come from `today`.
    pub fn resolve(&self, today: NaiveDate) -> Result<ResolvedContext, ContextError> {
        let (dow, month, week) = Calendar::from_date(today);
        let calendar = self.calendar();
        let resolved = self.build(
            calendar.day_of_week.unwrap_or(dow),
            calendar.month.unwrap_or(month),
            calendar.week_of_year.unwrap_or(week),
        );
        resolved.check()?;
        Ok(resolved)
    }

    /// Resolve a historical row. Calendar fields have no default for past
    /// rows; absent ones are filled with 0 and reported by name.
    pub fn resolve_for_training(
        &self,
    ) -> Result<(ResolvedContext, Vec<&'static str>), ContextError> {
        let calendar = self.calendar();
        let mut missing = Vec::new();
        let mut take = |value: Option<f64>, name: &'static str| {
            value.unwrap_or_else(|| {
                missing.push(name);
                0.0
            })
        };
        let day_of_week = take(calendar.day_of_week, "day_of_week");
        let month = take(calendar.month, "month");
        let week_of_year = take(calendar.week_of_year, "week_of_year");

        let resolved = self.build(day_of_week, month, week_of_year);
        // 0 is a legal fill for an absent month, so only range-check what was sent
        resolved.check_except(&missing)?;
        Ok((resolved, missing))
    }

    fn calendar(&self) -> Calendar {
        let derived = self.date.map(Calendar::from_date);
        Calendar {
            day_of_week: self.day_of_week.or(derived.map(|d| d.0)),
            month: self.month.or(derived.map(|d| d.1)),
            week_of_year: self.week_of_year.or(derived.map(|d| d.2)),
        }
    }

    fn build(&self, day_of_week: f64, month: f64, week_of_year: f64) -> ResolvedContext {
        let last = self.last_recipes.as_deref().unwrap_or_default();
        let soonest_stock_expiry = self
            .stock
            .as_deref()
            .and_then(|items| items.iter().map(|s| s.days_to_expiry).reduce(f64::min));

        ResolvedContext {
            date: self.date,
            day_of_week,
            month,
            week_of_year,
            planned_portions: self.planned_portions.unwrap_or(DEFAULT_PLANNED_PORTIONS),
            last_recipe_1: self
                .last_recipe_1
                .or_else(|| last.first().map(|&id| id as f64))
                .unwrap_or(0.0),
            last_recipe_2: self
                .last_recipe_2
                .or_else(|| last.get(1).map(|&id| id as f64))
                .unwrap_or(0.0),
            recipe_feasible: self.recipe_feasible.unwrap_or(DEFAULT_RECIPE_FEASIBLE),
            availability_score: self
                .availability_score
                .unwrap_or(DEFAULT_AVAILABILITY_SCORE),
            min_days_to_expiry: self
                .min_days_to_expiry
                .or(soonest_stock_expiry)
                .unwrap_or(DEFAULT_DAYS_TO_EXPIRY),
            nb_missing_ingredients: self.nb_missing_ingredients.unwrap_or(0.0),
            urgency_score: self.urgency_score.unwrap_or(DEFAULT_URGENCY_SCORE),
            soonest_stock_expiry,
        }
    }
}

impl ResolvedContext {
    fn check(&self) -> Result<(), ContextError> {
        self.check_except(&[])
    }

    fn check_except(&self, skip: &[&'static str]) -> Result<(), ContextError> {
        let rules: [(&'static str, f64, f64, f64, &'static str); 6] = [
            ("day_of_week", self.day_of_week, 0.0, 6.0, "0..=6"),
            ("month", self.month, 1.0, 12.0, "1..=12"),
            ("week_of_year", self.week_of_year, 1.0, 53.0, "1..=53"),
            ("availability_score", self.availability_score, 0.0, 1.0, "0..=1"),
            ("urgency_score", self.urgency_score, 0.0, 1.0, "0..=1"),
            ("planned_portions", self.planned_portions, 0.0, f64::MAX, ">= 0"),
        ];
        for (field, value, lo, hi, expected) in rules {
            if skip.contains(&field) {
                continue;
            }
            if !value.is_finite() || value < lo || value > hi {
                return Err(ContextError {
                    field,
                    value,
                    expected,
                });
            }
        }
        Ok(())
    }
}
