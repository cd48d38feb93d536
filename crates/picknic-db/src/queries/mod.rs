//! Query functions, one module per table family.

pub mod households;
pub mod meal_plans;
pub mod pantry;
pub mod recipes;
pub mod shopping_lists;
