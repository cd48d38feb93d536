//! Domain logic for picknic: the shopping-list engine, week arithmetic,
//! and the service layer for recipes, meal plans, pantry and shopping lists.

pub mod meal_plan;
pub mod pantry;
pub mod recipe;
pub mod shopping;
pub mod week;
