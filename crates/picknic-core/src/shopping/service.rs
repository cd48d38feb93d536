//! Shopping list service layer.
//!
//! Regeneration reads the week's plan and the household pantry, runs both
//! engine stages, then swaps the list's `AUTO` rows in one transaction.
//! `MANUAL` rows are never touched by regeneration.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use picknic_db::models::{ShoppingItemSource, ShoppingItemStatus, ShoppingList, ShoppingListItem};
use picknic_db::queries::meal_plans as meal_plan_db;
use picknic_db::queries::pantry as pantry_db;
use picknic_db::queries::shopping_lists as shopping_db;

use super::{PantryHolding, build_auto_shopping_items, subtract_pantry_from_shopping_items};
use crate::meal_plan::load_planned_entries;
use crate::recipe::draft::QuantityInput;
use crate::week::shopping_list_name;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShoppingListError {
    #[error("no meal plan found for the week of {week_start}")]
    MissingMealPlan { week_start: NaiveDate },

    #[error("ingredient_name is required")]
    MissingIngredientName,
}

/// A shopping list with all of its rows.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingListWithItems {
    #[serde(flatten)]
    pub list: ShoppingList,
    pub items: Vec<ShoppingListItem>,
}

/// A row typed in by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualItemDraft {
    #[serde(default)]
    pub ingredient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<QuantityInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Create the week's list row, or rename the existing one. The row lock
/// taken here is held until the surrounding transaction ends.
async fn upsert_list(
    conn: &mut PgConnection,
    household_id: Uuid,
    meal_plan_id: Uuid,
    user_id: &str,
    week_start: NaiveDate,
) -> Result<ShoppingList> {
    let list = sqlx::query_as::<_, ShoppingList>(
        "INSERT INTO shopping_lists (household_id, meal_plan_id, name, created_by) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (meal_plan_id) DO UPDATE SET name = EXCLUDED.name, updated_at = now() \
         RETURNING *",
    )
    .bind(household_id)
    .bind(meal_plan_id)
    .bind(shopping_list_name(week_start))
    .bind(user_id)
    .fetch_one(conn)
    .await
    .context("failed to upsert shopping list")?;

    Ok(list)
}

async fn with_items(pool: &PgPool, list: ShoppingList) -> Result<ShoppingListWithItems> {
    let items = shopping_db::list_items(pool, list.id).await?;
    Ok(ShoppingListWithItems { list, items })
}

async fn require_meal_plan_id(pool: &PgPool, household_id: Uuid, week_start: NaiveDate) -> Result<Uuid> {
    let plan = meal_plan_db::get_meal_plan_for_week(pool, household_id, week_start)
        .await?
        .ok_or(ShoppingListError::MissingMealPlan { week_start })?;
    Ok(plan.id)
}

/// Fetch the week's list. `None` when the week has no plan or the list was
/// never generated.
pub async fn get_shopping_list_for_week(
    pool: &PgPool,
    household_id: Uuid,
    week_start: NaiveDate,
) -> Result<Option<ShoppingListWithItems>> {
    let Some(plan) = meal_plan_db::get_meal_plan_for_week(pool, household_id, week_start).await?
    else {
        return Ok(None);
    };
    let Some(list) = shopping_db::get_shopping_list_for_meal_plan(pool, plan.id).await? else {
        return Ok(None);
    };

    with_items(pool, list).await.map(Some)
}

/// Rebuild the week's `AUTO` rows from its meal plan and the pantry.
///
/// Fails with [`ShoppingListError::MissingMealPlan`] when the week has no
/// plan. Concurrent regenerations of the same list are serialized by the
/// list row lock, so each run replaces the previous run's rows completely.
pub async fn generate_shopping_list_for_week(
    pool: &PgPool,
    household_id: Uuid,
    user_id: &str,
    week_start: NaiveDate,
) -> Result<ShoppingListWithItems> {
    let meal_plan_id = require_meal_plan_id(pool, household_id, week_start).await?;

    let entries = load_planned_entries(pool, meal_plan_id).await?;
    let pantry: Vec<PantryHolding> = pantry_db::list_pantry_items(pool, household_id)
        .await?
        .iter()
        .map(PantryHolding::from)
        .collect();

    let auto_items = subtract_pantry_from_shopping_items(&build_auto_shopping_items(&entries), &pantry);

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let list = upsert_list(&mut *tx, household_id, meal_plan_id, user_id, week_start).await?;

    let removed = sqlx::query(
        "DELETE FROM shopping_list_items WHERE shopping_list_id = $1 AND source = $2",
    )
    .bind(list.id)
    .bind(ShoppingItemSource::Auto)
    .execute(&mut *tx)
    .await
    .context("failed to clear generated shopping list items")?
    .rows_affected();

    for item in &auto_items {
        sqlx::query(
            "INSERT INTO shopping_list_items \
             (shopping_list_id, ingredient_name, quantity, unit, source, status) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(list.id)
        .bind(&item.ingredient_name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.source)
        .bind(item.status)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert shopping list item {:?}", item.ingredient_name))?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        household = %household_id,
        week_start = %week_start,
        meals = entries.len(),
        removed,
        inserted = auto_items.len(),
        "shopping list regenerated"
    );

    with_items(pool, list).await
}

/// Add a `MANUAL` row to the week's list, creating the list if needed.
pub async fn add_manual_item(
    pool: &PgPool,
    household_id: Uuid,
    user_id: &str,
    week_start: NaiveDate,
    draft: &ManualItemDraft,
) -> Result<ShoppingListItem> {
    let name = draft.ingredient_name.trim();
    if name.is_empty() {
        return Err(ShoppingListError::MissingIngredientName.into());
    }
    let meal_plan_id = require_meal_plan_id(pool, household_id, week_start).await?;

    let mut conn = pool.acquire().await.context("failed to acquire connection")?;
    let list = upsert_list(&mut *conn, household_id, meal_plan_id, user_id, week_start).await?;
    drop(conn);

    let unit = draft.unit.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let quantity = draft.quantity.as_ref().and_then(QuantityInput::value);

    shopping_db::insert_item(pool, list.id, name, quantity, unit, ShoppingItemSource::Manual).await
}

/// Mark a row as bought, skipped or pending again. `None` when the item does
/// not exist in the household.
pub async fn set_item_status(
    pool: &PgPool,
    household_id: Uuid,
    item_id: Uuid,
    status: ShoppingItemStatus,
) -> Result<Option<ShoppingListItem>> {
    shopping_db::update_item_status(pool, household_id, item_id, status).await
}

/// Delete a row from a household's list. `false` when it does not exist.
pub async fn remove_item(pool: &PgPool, household_id: Uuid, item_id: Uuid) -> Result<bool> {
    shopping_db::delete_item(pool, household_id, item_id).await
}
