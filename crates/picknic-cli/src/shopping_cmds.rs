//! CLI handlers for `picknic shopping` subcommands.
//!
//! - `picknic shopping generate` -- rebuild generated items for a week
//! - `picknic shopping show`     -- print the week's list
//! - `picknic shopping add`      -- add an item by hand
//! - `picknic shopping mark`     -- set an item's status

use anyhow::{Context, Result};
use sqlx::PgPool;

use picknic_core::recipe::draft::QuantityInput;
use picknic_core::shopping::{
    ManualItemDraft, ShoppingListWithItems, add_manual_item, generate_shopping_list_for_week,
    get_shopping_list_for_week, set_item_status,
};
use picknic_db::models::{ShoppingItemSource, ShoppingItemStatus, ShoppingListItem};

use crate::ShoppingCommands;
use crate::resolve::{parse_id, require_household, week_arg};

pub async fn run_shopping_command(
    command: ShoppingCommands,
    pool: &PgPool,
    user_id: &str,
) -> Result<()> {
    match command {
        ShoppingCommands::Generate { household, week } => {
            cmd_generate(pool, &household, user_id, week.as_deref()).await
        }
        ShoppingCommands::Show { household, week } => cmd_show(pool, &household, week.as_deref()).await,
        ShoppingCommands::Add {
            name,
            quantity,
            unit,
            household,
            week,
        } => {
            let draft = ManualItemDraft {
                ingredient_name: name,
                quantity: quantity.map(QuantityInput::Number),
                unit,
            };
            cmd_add(pool, &household, user_id, week.as_deref(), &draft).await
        }
        ShoppingCommands::Mark {
            item_id,
            status,
            household,
        } => cmd_mark(pool, &household, &item_id, &status).await,
    }
}

async fn cmd_generate(pool: &PgPool, household: &str, user_id: &str, week: Option<&str>) -> Result<()> {
    let household = require_household(pool, household).await?;
    let week_start = week_arg(week)?;

    let list = generate_shopping_list_for_week(pool, household.id, user_id, week_start).await?;
    let generated = list
        .items
        .iter()
        .filter(|i| i.source == ShoppingItemSource::Auto)
        .count();

    println!("{} regenerated: {generated} generated item(s).", list.list.name);
    println!();
    print_list(&list);
    Ok(())
}

async fn cmd_show(pool: &PgPool, household: &str, week: Option<&str>) -> Result<()> {
    let household = require_household(pool, household).await?;
    let week_start = week_arg(week)?;

    match get_shopping_list_for_week(pool, household.id, week_start).await? {
        Some(list) => {
            println!("{}", list.list.name);
            println!();
            print_list(&list);
        }
        None => println!(
            "No shopping list for the week of {week_start}. Use `picknic shopping generate` to build one."
        ),
    }
    Ok(())
}

async fn cmd_add(
    pool: &PgPool,
    household: &str,
    user_id: &str,
    week: Option<&str>,
    draft: &ManualItemDraft,
) -> Result<()> {
    let household = require_household(pool, household).await?;
    let week_start = week_arg(week)?;

    let item = add_manual_item(pool, household.id, user_id, week_start, draft).await?;
    println!("Added {} ({}).", describe(&item), item.id);
    Ok(())
}

async fn cmd_mark(pool: &PgPool, household: &str, item_id: &str, status: &str) -> Result<()> {
    let household = require_household(pool, household).await?;
    let id = parse_id("shopping list item", item_id)?;
    let status: ShoppingItemStatus = status.parse()?;

    let item = set_item_status(pool, household.id, id, status)
        .await?
        .with_context(|| format!("shopping list item {id} not found"))?;
    println!("{} is now {}.", describe(&item), item.status);
    Ok(())
}

/// `"1.5 kg Flour"`, `"Salt"`, and so on.
fn describe(item: &ShoppingListItem) -> String {
    match (item.quantity, item.unit.as_deref()) {
        (Some(q), Some(u)) => format!("{q} {u} {}", item.ingredient_name),
        (Some(q), None) => format!("{q} {}", item.ingredient_name),
        (None, Some(u)) => format!("{} ({u})", item.ingredient_name),
        (None, None) => item.ingredient_name.clone(),
    }
}

fn print_list(list: &ShoppingListWithItems) {
    if list.items.is_empty() {
        println!("  (empty)");
        return;
    }

    for item in &list.items {
        let mark = match item.status {
            ShoppingItemStatus::Pending => "[ ]",
            ShoppingItemStatus::Bought => "[x]",
            ShoppingItemStatus::Skipped => "[-]",
        };
        let origin = match item.source {
            ShoppingItemSource::Auto => "",
            ShoppingItemSource::Manual => "  (manual)",
        };
        println!("  {mark} {}{origin}  {}", describe(item), item.id);
    }
}
