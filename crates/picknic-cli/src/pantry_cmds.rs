//! CLI handlers for `picknic pantry` subcommands.

use anyhow::Result;
use sqlx::PgPool;

use picknic_core::pantry::{PantryDraft, delete_pantry_item, list_pantry_items, upsert_pantry_item};
use picknic_core::recipe::draft::QuantityInput;

use crate::PantryCommands;
use crate::resolve::{parse_id, require_household};

pub async fn run_pantry_command(command: PantryCommands, pool: &PgPool, user_id: &str) -> Result<()> {
    match command {
        PantryCommands::Add {
            name,
            quantity,
            unit,
            expires,
            household,
        } => {
            let draft = PantryDraft {
                ingredient_name: name,
                quantity: Some(QuantityInput::Number(quantity)),
                unit,
                expires_at: expires,
            };
            cmd_add(pool, &household, user_id, &draft).await
        }
        PantryCommands::List { household } => cmd_list(pool, &household).await,
        PantryCommands::Remove { item_id, household } => cmd_remove(pool, &household, &item_id).await,
    }
}

async fn cmd_add(pool: &PgPool, household: &str, user_id: &str, draft: &PantryDraft) -> Result<()> {
    let household = require_household(pool, household).await?;
    let item = draft.validate()?;

    let row = upsert_pantry_item(pool, household.id, user_id, &item).await?;
    println!(
        "Pantry now has {} {} of {} ({}).",
        row.quantity, row.unit, row.ingredient_name, row.id
    );
    Ok(())
}

async fn cmd_list(pool: &PgPool, household: &str) -> Result<()> {
    let household = require_household(pool, household).await?;
    let items = list_pantry_items(pool, household.id).await?;

    if items.is_empty() {
        println!("Pantry is empty.");
        return Ok(());
    }

    let name_w = items
        .iter()
        .map(|i| i.ingredient_name.len())
        .max()
        .unwrap_or(10)
        .max(10);

    println!(
        "{:<36}  {:<name_w$}  {:>10}  {:<6}  EXPIRES",
        "ID", "INGREDIENT", "QUANTITY", "UNIT"
    );
    for item in &items {
        println!(
            "{:<36}  {:<name_w$}  {:>10}  {:<6}  {}",
            item.id,
            item.ingredient_name,
            item.quantity,
            item.unit,
            item.expires_at
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

async fn cmd_remove(pool: &PgPool, household: &str, item_id: &str) -> Result<()> {
    let household = require_household(pool, household).await?;
    let id = parse_id("pantry item", item_id)?;

    if !delete_pantry_item(pool, household.id, id).await? {
        anyhow::bail!("pantry item {id} not found");
    }
    println!("Pantry item {id} removed.");
    Ok(())
}
