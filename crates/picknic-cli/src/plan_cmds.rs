//! CLI handlers for `picknic plan` subcommands.
//!
//! - `picknic plan set <file>` -- save entries from a meal plan TOML file
//! - `picknic plan show`       -- the week's meals

use anyhow::{Context, Result};
use sqlx::PgPool;

use picknic_core::meal_plan::{MealPlanWithMeals, get_meal_plan_for_week, parse_meal_plan_toml, save_meal_plan};

use crate::PlanCommands;
use crate::resolve::{require_household, week_arg};

pub async fn run_plan_command(command: PlanCommands, pool: &PgPool, user_id: &str) -> Result<()> {
    match command {
        PlanCommands::Set { file, household } => cmd_set(pool, &household, user_id, &file).await,
        PlanCommands::Show { household, week } => cmd_show(pool, &household, week.as_deref()).await,
    }
}

async fn cmd_set(pool: &PgPool, household: &str, user_id: &str, file_path: &str) -> Result<()> {
    let household = require_household(pool, household).await?;

    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read meal plan file: {file_path}"))?;
    let draft = parse_meal_plan_toml(&content)
        .with_context(|| format!("failed to parse meal plan file: {file_path}"))?;

    let submitted = draft.entries.len();
    let new_plan = draft.normalize()?;
    let skipped = submitted - new_plan.entries.len();

    let saved = save_meal_plan(pool, household.id, user_id, &new_plan).await?;

    println!("Meal plan saved for the week of {}.", saved.plan.week_start);
    println!("  Entries saved: {}", new_plan.entries.len());
    if skipped > 0 {
        println!("  Entries skipped (bad date, meal type or recipe ID): {skipped}");
    }
    println!();
    print_meals(&saved);
    Ok(())
}

async fn cmd_show(pool: &PgPool, household: &str, week: Option<&str>) -> Result<()> {
    let household = require_household(pool, household).await?;
    let week_start = week_arg(week)?;

    match get_meal_plan_for_week(pool, household.id, week_start).await? {
        Some(plan) => {
            println!("Meal plan for the week of {week_start}");
            println!();
            print_meals(&plan);
        }
        None => {
            println!("No meal plan for the week of {week_start}. Use `picknic plan set <file>` to create one.");
        }
    }
    Ok(())
}

fn print_meals(plan: &MealPlanWithMeals) {
    if plan.meals.is_empty() {
        println!("  (no meals)");
        return;
    }

    println!("  {:<10}  {:<9}  {:>8}  RECIPE", "DATE", "MEAL", "SERVINGS");
    for meal in &plan.meals {
        let servings = meal.servings_override.unwrap_or(meal.recipe_servings);
        println!(
            "  {:<10}  {:<9}  {:>8}  {}",
            meal.date.format("%Y-%m-%d").to_string(),
            meal.meal_type.to_string(),
            servings,
            meal.recipe_title,
        );
    }
}
