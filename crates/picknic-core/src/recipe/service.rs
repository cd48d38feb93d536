//! Recipe service layer.
//!
//! Creating a recipe writes the recipe row, its ingredient lines and its
//! steps inside a single transaction.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use picknic_db::models::{Recipe, RecipeIngredient, RecipeStep};
use picknic_db::queries::recipes as recipe_db;

use super::draft::NewRecipe;

/// A recipe with its ingredient lines and steps, in authored order.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeWithDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
}

/// Store a validated recipe for a household.
pub async fn create_recipe(
    pool: &PgPool,
    household_id: Uuid,
    user_id: &str,
    new_recipe: &NewRecipe,
) -> Result<RecipeWithDetails> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let recipe = sqlx::query_as::<_, Recipe>(
        "INSERT INTO recipes (household_id, title, description, servings, tags, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(household_id)
    .bind(&new_recipe.title)
    .bind(&new_recipe.description)
    .bind(new_recipe.servings)
    .bind(&new_recipe.tags)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await
    .context("failed to insert recipe")?;

    let mut ingredients = Vec::with_capacity(new_recipe.ingredients.len());
    for ingredient in &new_recipe.ingredients {
        let row = sqlx::query_as::<_, RecipeIngredient>(
            "INSERT INTO recipe_ingredients (recipe_id, position, name, quantity, unit) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(recipe.id)
        .bind(ingredient.position)
        .bind(&ingredient.name)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to insert ingredient {:?}", ingredient.name))?;
        ingredients.push(row);
    }

    let mut steps = Vec::with_capacity(new_recipe.steps.len());
    for step in &new_recipe.steps {
        let row = sqlx::query_as::<_, RecipeStep>(
            "INSERT INTO recipe_steps (recipe_id, position, instruction) \
             VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(recipe.id)
        .bind(step.position)
        .bind(&step.instruction)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to insert step {}", step.position))?;
        steps.push(row);
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        household = %household_id,
        recipe = %recipe.id,
        ingredients = ingredients.len(),
        "recipe created"
    );

    Ok(RecipeWithDetails {
        recipe,
        ingredients,
        steps,
    })
}

/// Fetch a recipe with its ingredients and steps, scoped to the household.
pub async fn get_recipe_with_details(
    pool: &PgPool,
    household_id: Uuid,
    recipe_id: Uuid,
) -> Result<Option<RecipeWithDetails>> {
    let Some(recipe) = recipe_db::get_recipe(pool, household_id, recipe_id).await? else {
        return Ok(None);
    };

    let ingredients = recipe_db::list_ingredients(pool, recipe.id).await?;
    let steps = recipe_db::list_steps(pool, recipe.id).await?;

    Ok(Some(RecipeWithDetails {
        recipe,
        ingredients,
        steps,
    }))
}

/// List a household's recipes with their details, most recently updated
/// first.
pub async fn list_recipes(pool: &PgPool, household_id: Uuid) -> Result<Vec<RecipeWithDetails>> {
    let recipes = recipe_db::list_recipes(pool, household_id).await?;

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let ingredients = recipe_db::list_ingredients(pool, recipe.id).await?;
        let steps = recipe_db::list_steps(pool, recipe.id).await?;
        results.push(RecipeWithDetails {
            recipe,
            ingredients,
            steps,
        });
    }
    Ok(results)
}

/// Delete a recipe. Returns `false` when it does not exist in the household.
pub async fn delete_recipe(pool: &PgPool, household_id: Uuid, recipe_id: Uuid) -> Result<bool> {
    let deleted = recipe_db::delete_recipe(pool, household_id, recipe_id).await?;
    if deleted {
        info!(household = %household_id, recipe = %recipe_id, "recipe deleted");
    }
    Ok(deleted)
}
