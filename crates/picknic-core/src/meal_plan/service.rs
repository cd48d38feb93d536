//! Meal plan service layer.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use picknic_db::models::MealPlan;
use picknic_db::queries::meal_plans::{self as meal_plan_db, PlannedMeal};
use picknic_db::queries::recipes as recipe_db;

use super::MealPlanError;
use super::draft::NewMealPlan;
use crate::shopping::{IngredientLine, PlannedEntry, PlannedRecipe};

/// A meal plan with its scheduled meals.
#[derive(Debug, Clone, Serialize)]
pub struct MealPlanWithMeals {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub meals: Vec<PlannedMeal>,
}

/// Save a week's plan for a household.
///
/// Every referenced recipe must belong to the household; otherwise nothing
/// is written and [`MealPlanError::ForeignRecipes`] is returned. The plan is
/// created on first use and each entry replaces whatever occupied the same
/// date and meal before. Entries not mentioned are left alone.
pub async fn save_meal_plan(
    pool: &PgPool,
    household_id: Uuid,
    user_id: &str,
    new_plan: &NewMealPlan,
) -> Result<MealPlanWithMeals> {
    if new_plan.entries.is_empty() {
        return Err(MealPlanError::NoEntries.into());
    }

    let wanted = new_plan.recipe_ids();
    let owned = recipe_db::owned_recipe_ids(pool, household_id, &wanted).await?;
    let foreign: Vec<Uuid> = wanted.into_iter().filter(|id| !owned.contains(id)).collect();
    if !foreign.is_empty() {
        return Err(MealPlanError::ForeignRecipes(foreign).into());
    }

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    // The no-op update lets RETURNING yield the existing row.
    let plan = sqlx::query_as::<_, MealPlan>(
        "INSERT INTO meal_plans (household_id, week_start, created_by) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (household_id, week_start) DO UPDATE SET week_start = EXCLUDED.week_start \
         RETURNING *",
    )
    .bind(household_id)
    .bind(new_plan.week_start)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await
    .context("failed to upsert meal plan")?;

    for entry in &new_plan.entries {
        sqlx::query(
            "INSERT INTO meal_plan_entries (meal_plan_id, date, meal_type, recipe_id, servings_override) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (meal_plan_id, date, meal_type) DO UPDATE \
             SET recipe_id = EXCLUDED.recipe_id, servings_override = EXCLUDED.servings_override",
        )
        .bind(plan.id)
        .bind(entry.date)
        .bind(entry.meal_type)
        .bind(entry.recipe_id)
        .bind(entry.servings_override)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to upsert {} entry on {}", entry.meal_type, entry.date))?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        household = %household_id,
        week_start = %new_plan.week_start,
        entries = new_plan.entries.len(),
        "meal plan saved"
    );

    let meals = meal_plan_db::list_planned_meals(pool, plan.id).await?;
    Ok(MealPlanWithMeals { plan, meals })
}

/// Fetch the household's plan for the week starting on `week_start`.
pub async fn get_meal_plan_for_week(
    pool: &PgPool,
    household_id: Uuid,
    week_start: NaiveDate,
) -> Result<Option<MealPlanWithMeals>> {
    let Some(plan) = meal_plan_db::get_meal_plan_for_week(pool, household_id, week_start).await?
    else {
        return Ok(None);
    };

    let meals = meal_plan_db::list_planned_meals(pool, plan.id).await?;
    Ok(Some(MealPlanWithMeals { plan, meals }))
}

/// Load a stored plan as shopping-engine input: one [`PlannedEntry`] per
/// scheduled meal, carrying its recipe's servings and ingredient lines.
pub async fn load_planned_entries(pool: &PgPool, meal_plan_id: Uuid) -> Result<Vec<PlannedEntry>> {
    let meals = meal_plan_db::list_planned_meals(pool, meal_plan_id).await?;

    let mut recipe_ids: Vec<Uuid> = meals.iter().map(|m| m.recipe_id).collect();
    recipe_ids.sort_unstable();
    recipe_ids.dedup();

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<IngredientLine>> = HashMap::new();
    for row in recipe_db::list_ingredients_for_recipes(pool, &recipe_ids).await? {
        ingredients_by_recipe
            .entry(row.recipe_id)
            .or_default()
            .push(IngredientLine::from(&row));
    }

    Ok(meals
        .iter()
        .map(|meal| PlannedEntry {
            servings_override: meal.servings_override,
            recipe: PlannedRecipe {
                servings: meal.recipe_servings,
                ingredients: ingredients_by_recipe
                    .get(&meal.recipe_id)
                    .cloned()
                    .unwrap_or_default(),
            },
        })
        .collect())
}
