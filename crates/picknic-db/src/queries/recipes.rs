//! Database query functions for the `recipes`, `recipe_ingredients`, and
//! `recipe_steps` tables.
//!
//! Recipe creation spans all three tables and lives in the core service
//! layer, inside a transaction.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Recipe, RecipeIngredient, RecipeStep};

/// Fetch a recipe by ID, scoped to its household.
pub async fn get_recipe(pool: &PgPool, household_id: Uuid, id: Uuid) -> Result<Option<Recipe>> {
    let recipe =
        sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1 AND household_id = $2")
            .bind(id)
            .bind(household_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch recipe")?;

    Ok(recipe)
}

/// List a household's recipes, most recently updated first.
pub async fn list_recipes(pool: &PgPool, household_id: Uuid) -> Result<Vec<Recipe>> {
    let recipes = sqlx::query_as::<_, Recipe>(
        "SELECT * FROM recipes WHERE household_id = $1 ORDER BY updated_at DESC, title",
    )
    .bind(household_id)
    .fetch_all(pool)
    .await
    .context("failed to list recipes")?;

    Ok(recipes)
}

/// List the ingredient lines of a recipe in authored order.
pub async fn list_ingredients(pool: &PgPool, recipe_id: Uuid) -> Result<Vec<RecipeIngredient>> {
    let ingredients = sqlx::query_as::<_, RecipeIngredient>(
        "SELECT * FROM recipe_ingredients WHERE recipe_id = $1 ORDER BY position",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .context("failed to list recipe ingredients")?;

    Ok(ingredients)
}

/// List ingredient lines for several recipes at once, grouped by recipe and
/// ordered by position within each recipe.
pub async fn list_ingredients_for_recipes(
    pool: &PgPool,
    recipe_ids: &[Uuid],
) -> Result<Vec<RecipeIngredient>> {
    let ingredients = sqlx::query_as::<_, RecipeIngredient>(
        "SELECT * FROM recipe_ingredients WHERE recipe_id = ANY($1) ORDER BY recipe_id, position",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .context("failed to list ingredients for recipes")?;

    Ok(ingredients)
}

/// List the steps of a recipe in authored order.
pub async fn list_steps(pool: &PgPool, recipe_id: Uuid) -> Result<Vec<RecipeStep>> {
    let steps = sqlx::query_as::<_, RecipeStep>(
        "SELECT * FROM recipe_steps WHERE recipe_id = $1 ORDER BY position",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .context("failed to list recipe steps")?;

    Ok(steps)
}

/// Return the subset of `recipe_ids` that belong to the household.
pub async fn owned_recipe_ids(
    pool: &PgPool,
    household_id: Uuid,
    recipe_ids: &[Uuid],
) -> Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT id FROM recipes WHERE household_id = $1 AND id = ANY($2)")
            .bind(household_id)
            .bind(recipe_ids)
            .fetch_all(pool)
            .await
            .context("failed to check recipe ownership")?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Delete a recipe (ingredients, steps and plan entries cascade).
///
/// Returns `false` when no recipe with that ID exists in the household.
pub async fn delete_recipe(pool: &PgPool, household_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND household_id = $2")
        .bind(id)
        .bind(household_id)
        .execute(pool)
        .await
        .context("failed to delete recipe")?;

    Ok(result.rows_affected() > 0)
}
