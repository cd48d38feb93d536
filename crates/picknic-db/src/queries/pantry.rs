//! Database query functions for the `pantry_items` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PantryItem;

/// Insert a pantry item, or overwrite the quantity and expiry of the existing
/// row with the same household, name and unit.
pub async fn upsert_pantry_item(
    pool: &PgPool,
    household_id: Uuid,
    user_id: &str,
    ingredient_name: &str,
    quantity: f64,
    unit: &str,
    expires_at: Option<NaiveDate>,
) -> Result<PantryItem> {
    let item = sqlx::query_as::<_, PantryItem>(
        "INSERT INTO pantry_items (household_id, ingredient_name, quantity, unit, expires_at, updated_by) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (household_id, ingredient_name, unit) DO UPDATE \
         SET quantity = EXCLUDED.quantity, \
             expires_at = EXCLUDED.expires_at, \
             updated_by = EXCLUDED.updated_by, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(household_id)
    .bind(ingredient_name)
    .bind(quantity)
    .bind(unit)
    .bind(expires_at)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("failed to upsert pantry item")?;

    Ok(item)
}

/// Fetch a pantry item by ID, scoped to its household.
pub async fn get_pantry_item(
    pool: &PgPool,
    household_id: Uuid,
    id: Uuid,
) -> Result<Option<PantryItem>> {
    let item = sqlx::query_as::<_, PantryItem>(
        "SELECT * FROM pantry_items WHERE id = $1 AND household_id = $2",
    )
    .bind(id)
    .bind(household_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch pantry item")?;

    Ok(item)
}

/// List a household's pantry, ordered by ingredient name then unit.
pub async fn list_pantry_items(pool: &PgPool, household_id: Uuid) -> Result<Vec<PantryItem>> {
    let items = sqlx::query_as::<_, PantryItem>(
        "SELECT * FROM pantry_items WHERE household_id = $1 ORDER BY ingredient_name, unit",
    )
    .bind(household_id)
    .fetch_all(pool)
    .await
    .context("failed to list pantry items")?;

    Ok(items)
}

/// Partially update a pantry item. `None` leaves a column as it is;
/// `expires_at` is `Some(None)` to clear the expiry.
///
/// Returns `None` when the item does not exist in the household.
pub async fn update_pantry_item(
    pool: &PgPool,
    household_id: Uuid,
    id: Uuid,
    user_id: &str,
    quantity: Option<f64>,
    unit: Option<&str>,
    expires_at: Option<Option<NaiveDate>>,
) -> Result<Option<PantryItem>> {
    let item = sqlx::query_as::<_, PantryItem>(
        "UPDATE pantry_items \
         SET quantity = COALESCE($3, quantity), \
             unit = COALESCE($4, unit), \
             expires_at = CASE WHEN $5 THEN $6 ELSE expires_at END, \
             updated_by = $7, \
             updated_at = now() \
         WHERE id = $1 AND household_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(household_id)
    .bind(quantity)
    .bind(unit)
    .bind(expires_at.is_some())
    .bind(expires_at.flatten())
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("failed to update pantry item")?;

    Ok(item)
}

/// Delete a pantry item. Returns `false` when it does not exist in the
/// household.
pub async fn delete_pantry_item(pool: &PgPool, household_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM pantry_items WHERE id = $1 AND household_id = $2")
        .bind(id)
        .bind(household_id)
        .execute(pool)
        .await
        .context("failed to delete pantry item")?;

    Ok(result.rows_affected() > 0)
}
