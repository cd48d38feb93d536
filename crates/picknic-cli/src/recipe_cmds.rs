//! CLI handlers for `picknic recipe` subcommands.
//!
//! - `picknic recipe add <file>`   -- store a recipe written as TOML
//! - `picknic recipe list`         -- the household's recipes
//! - `picknic recipe show <id>`    -- ingredients and steps
//! - `picknic recipe delete <id>`

use anyhow::{Context, Result};
use sqlx::PgPool;

use picknic_core::recipe::{
    RecipeWithDetails, create_recipe, delete_recipe, get_recipe_with_details, list_recipes,
    parse_recipe_toml,
};

use crate::RecipeCommands;
use crate::resolve::{parse_id, require_household};

pub async fn run_recipe_command(command: RecipeCommands, pool: &PgPool, user_id: &str) -> Result<()> {
    match command {
        RecipeCommands::Add { file, household } => cmd_add(pool, &household, user_id, &file).await,
        RecipeCommands::List { household } => cmd_list(pool, &household).await,
        RecipeCommands::Show {
            recipe_id,
            household,
        } => cmd_show(pool, &household, &recipe_id).await,
        RecipeCommands::Delete {
            recipe_id,
            household,
        } => cmd_delete(pool, &household, &recipe_id).await,
    }
}

async fn cmd_add(pool: &PgPool, household: &str, user_id: &str, file_path: &str) -> Result<()> {
    let household = require_household(pool, household).await?;

    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read recipe file: {file_path}"))?;
    let new_recipe = parse_recipe_toml(&content)
        .with_context(|| format!("failed to parse recipe file: {file_path}"))?;

    let created = create_recipe(pool, household.id, user_id, &new_recipe).await?;

    println!("Recipe created.");
    println!();
    println!("  Recipe ID:   {}", created.recipe.id);
    println!("  Title:       {}", created.recipe.title);
    println!("  Servings:    {}", created.recipe.servings);
    println!("  Ingredients: {}", created.ingredients.len());
    println!("  Steps:       {}", created.steps.len());
    Ok(())
}

async fn cmd_list(pool: &PgPool, household: &str) -> Result<()> {
    let household = require_household(pool, household).await?;
    let recipes = list_recipes(pool, household.id).await?;

    if recipes.is_empty() {
        println!("No recipes found. Use `picknic recipe add <file>` to add one.");
        return Ok(());
    }

    let title_w = recipes
        .iter()
        .map(|r| r.recipe.title.len())
        .max()
        .unwrap_or(5)
        .max(5);

    println!("{:<36}  {:<title_w$}  {:>8}  TAGS", "ID", "TITLE", "SERVINGS");
    for RecipeWithDetails { recipe, .. } in &recipes {
        println!(
            "{:<36}  {:<title_w$}  {:>8}  {}",
            recipe.id,
            recipe.title,
            recipe.servings,
            recipe.tags.join(", "),
        );
    }
    Ok(())
}

async fn cmd_show(pool: &PgPool, household: &str, recipe_id: &str) -> Result<()> {
    let household = require_household(pool, household).await?;
    let id = parse_id("recipe", recipe_id)?;

    let details = get_recipe_with_details(pool, household.id, id)
        .await?
        .with_context(|| format!("recipe {id} not found"))?;
    let recipe = &details.recipe;

    println!("{}", recipe.title);
    println!();
    println!("  ID:       {}", recipe.id);
    println!("  Servings: {}", recipe.servings);
    if !recipe.tags.is_empty() {
        println!("  Tags:     {}", recipe.tags.join(", "));
    }
    if let Some(description) = &recipe.description {
        println!();
        println!("  {description}");
    }

    println!();
    println!("Ingredients:");
    for ingredient in &details.ingredients {
        let amount = match (ingredient.quantity, ingredient.unit.as_deref()) {
            (Some(q), Some(u)) => format!("{q} {u}"),
            (Some(q), None) => q.to_string(),
            (None, Some(u)) => u.to_string(),
            (None, None) => String::new(),
        };
        println!("  - {:<10} {}", amount, ingredient.name);
    }

    if !details.steps.is_empty() {
        println!();
        println!("Steps:");
        for step in &details.steps {
            println!("  {}. {}", step.position, step.instruction);
        }
    }
    Ok(())
}

async fn cmd_delete(pool: &PgPool, household: &str, recipe_id: &str) -> Result<()> {
    let household = require_household(pool, household).await?;
    let id = parse_id("recipe", recipe_id)?;

    if !delete_recipe(pool, household.id, id).await? {
        anyhow::bail!("recipe {id} not found");
    }
    println!("Recipe {id} deleted.");
    Ok(())
}
