//! Shopping-list derivation.
//!
//! Two pure stages, usable separately or chained:
//!
//! 1. [`build_auto_shopping_items`] turns a week's planned meals into
//!    deduplicated, scaled, summed `AUTO` rows.
//! 2. [`subtract_pantry_from_shopping_items`] removes what the household
//!    already has on hand.
//!
//! [`service`] wires both stages to the database.

pub mod aggregate;
pub mod normalize;
pub mod pantry;
pub mod service;

use serde::{Deserialize, Serialize};

use picknic_db::models::{PantryItem, RecipeIngredient, ShoppingItemSource, ShoppingItemStatus};

pub use aggregate::build_auto_shopping_items;
pub use normalize::AggregationKey;
pub use pantry::{pantry_totals, subtract_pantry_from_shopping_items};
pub use service::{
    ManualItemDraft, ShoppingListError, ShoppingListWithItems, add_manual_item,
    generate_shopping_list_for_week, get_shopping_list_for_week, remove_item, set_item_status,
};

/// One ingredient line of a recipe, as the aggregator reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    /// `None` means "unknown amount" (e.g. salt to taste).
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl From<&RecipeIngredient> for IngredientLine {
    fn from(row: &RecipeIngredient) -> Self {
        Self {
            name: row.name.clone(),
            quantity: row.quantity,
            unit: row.unit.clone(),
        }
    }
}

/// The parts of a recipe that matter for shopping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRecipe {
    /// Base serving count the ingredient quantities are written for.
    pub servings: i32,
    pub ingredients: Vec<IngredientLine>,
}

/// A scheduled meal: a recipe plus an optional per-meal serving count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedEntry {
    pub servings_override: Option<i32>,
    pub recipe: PlannedRecipe,
}

/// A shopping-list row before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingAggregate {
    pub ingredient_name: String,
    pub unit: Option<String>,
    /// `None` when at least one contributing line had no usable quantity.
    pub quantity: Option<f64>,
    pub source: ShoppingItemSource,
    pub status: ShoppingItemStatus,
}

/// What the household has on hand. Only holdings with a name, a unit and a
/// positive finite quantity take part in pantry subtraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryHolding {
    pub ingredient_name: String,
    pub unit: String,
    pub quantity: Option<f64>,
}

impl From<&PantryItem> for PantryHolding {
    fn from(row: &PantryItem) -> Self {
        Self {
            ingredient_name: row.ingredient_name.clone(),
            unit: row.unit.clone(),
            quantity: Some(row.quantity),
        }
    }
}
