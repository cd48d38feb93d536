//! Database query functions for the `meal_plans` and `meal_plan_entries`
//! tables.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{MealPlan, MealType};

/// Ordering of meal types within a day (breakfast first).
const MEAL_TYPE_ORDER: &str = "CASE e.meal_type \
     WHEN 'BREAKFAST' THEN 0 WHEN 'LUNCH' THEN 1 WHEN 'DINNER' THEN 2 ELSE 3 END";

/// A meal-plan entry joined with the recipe it schedules.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlannedMeal {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub servings_override: Option<i32>,
    pub recipe_id: Uuid,
    pub recipe_title: String,
    pub recipe_servings: i32,
}

/// Fetch the household's meal plan for the week starting on `week_start`.
pub async fn get_meal_plan_for_week(
    pool: &PgPool,
    household_id: Uuid,
    week_start: NaiveDate,
) -> Result<Option<MealPlan>> {
    let plan = sqlx::query_as::<_, MealPlan>(
        "SELECT * FROM meal_plans WHERE household_id = $1 AND week_start = $2",
    )
    .bind(household_id)
    .bind(week_start)
    .fetch_optional(pool)
    .await
    .context("failed to fetch meal plan")?;

    Ok(plan)
}

/// List the entries of a meal plan with their recipes, ordered by date and
/// then meal of the day.
pub async fn list_planned_meals(pool: &PgPool, meal_plan_id: Uuid) -> Result<Vec<PlannedMeal>> {
    let query = format!(
        "SELECT e.id, e.date, e.meal_type, e.servings_override, \
                r.id AS recipe_id, r.title AS recipe_title, r.servings AS recipe_servings \
         FROM meal_plan_entries e \
         JOIN recipes r ON r.id = e.recipe_id \
         WHERE e.meal_plan_id = $1 \
         ORDER BY e.date, {MEAL_TYPE_ORDER}"
    );
    let meals = sqlx::query_as::<_, PlannedMeal>(&query)
        .bind(meal_plan_id)
        .fetch_all(pool)
        .await
        .context("failed to list planned meals")?;

    Ok(meals)
}
