//! Weekly meal plans: entry validation, saving a week's plan, and loading a
//! stored plan in the shape the shopping engine consumes.

pub mod draft;
pub mod service;

use thiserror::Error;
use uuid::Uuid;

pub use draft::{EntryDraft, MealPlanDraft, NewEntry, NewMealPlan, parse_meal_plan_toml};
pub use service::{MealPlanWithMeals, get_meal_plan_for_week, load_planned_entries, save_meal_plan};

/// Reasons a meal plan submission is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MealPlanError {
    #[error("at least one valid meal plan entry is required")]
    NoEntries,

    #[error("recipes do not belong to the household: {}", format_ids(.0))]
    ForeignRecipes(Vec<Uuid>),
}

fn format_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
