//! Database query functions for the `shopping_lists` and
//! `shopping_list_items` tables.
//!
//! Replacing a list's `AUTO` rows is a multi-statement operation and lives
//! in the core service layer, inside a transaction.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ShoppingItemSource, ShoppingItemStatus, ShoppingList, ShoppingListItem};

/// Fetch the shopping list attached to a meal plan, if one was generated.
pub async fn get_shopping_list_for_meal_plan(
    pool: &PgPool,
    meal_plan_id: Uuid,
) -> Result<Option<ShoppingList>> {
    let list = sqlx::query_as::<_, ShoppingList>(
        "SELECT * FROM shopping_lists WHERE meal_plan_id = $1",
    )
    .bind(meal_plan_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch shopping list")?;

    Ok(list)
}

/// List the items of a shopping list: pending first, then bought, then
/// skipped; alphabetical within each status.
pub async fn list_items(pool: &PgPool, shopping_list_id: Uuid) -> Result<Vec<ShoppingListItem>> {
    let items = sqlx::query_as::<_, ShoppingListItem>(
        "SELECT * FROM shopping_list_items \
         WHERE shopping_list_id = $1 \
         ORDER BY CASE status WHEN 'PENDING' THEN 0 WHEN 'BOUGHT' THEN 1 ELSE 2 END, \
                  lower(ingredient_name), unit NULLS FIRST",
    )
    .bind(shopping_list_id)
    .fetch_all(pool)
    .await
    .context("failed to list shopping list items")?;

    Ok(items)
}

/// Insert a single item into a shopping list with `PENDING` status.
pub async fn insert_item(
    pool: &PgPool,
    shopping_list_id: Uuid,
    ingredient_name: &str,
    quantity: Option<f64>,
    unit: Option<&str>,
    source: ShoppingItemSource,
) -> Result<ShoppingListItem> {
    let item = sqlx::query_as::<_, ShoppingListItem>(
        "INSERT INTO shopping_list_items (shopping_list_id, ingredient_name, quantity, unit, source) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(shopping_list_id)
    .bind(ingredient_name)
    .bind(quantity)
    .bind(unit)
    .bind(source)
    .fetch_one(pool)
    .await
    .context("failed to insert shopping list item")?;

    Ok(item)
}

/// Set the status of an item, scoped to the owning household.
///
/// Returns `None` when the item does not exist in that household.
pub async fn update_item_status(
    pool: &PgPool,
    household_id: Uuid,
    item_id: Uuid,
    status: ShoppingItemStatus,
) -> Result<Option<ShoppingListItem>> {
    let item = sqlx::query_as::<_, ShoppingListItem>(
        "UPDATE shopping_list_items i \
         SET status = $3 \
         FROM shopping_lists l \
         WHERE i.id = $1 AND i.shopping_list_id = l.id AND l.household_id = $2 \
         RETURNING i.*",
    )
    .bind(item_id)
    .bind(household_id)
    .bind(status)
    .fetch_optional(pool)
    .await
    .context("failed to update shopping list item status")?;

    Ok(item)
}

/// Delete an item from a household's shopping list.
pub async fn delete_item(pool: &PgPool, household_id: Uuid, item_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "DELETE FROM shopping_list_items i \
         USING shopping_lists l \
         WHERE i.id = $1 AND i.shopping_list_id = l.id AND l.household_id = $2",
    )
    .bind(item_id)
    .bind(household_id)
    .execute(pool)
    .await
    .context("failed to delete shopping list item")?;

    Ok(result.rows_affected() > 0)
}
