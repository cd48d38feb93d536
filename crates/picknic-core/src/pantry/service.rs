//! Pantry service layer.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use picknic_db::models::PantryItem;
use picknic_db::queries::pantry as pantry_db;

use super::draft::{NewPantryItem, PantryChanges};

/// Record stock for an ingredient. An existing row with the same name and
/// unit has its quantity and expiry replaced, not added to.
pub async fn upsert_pantry_item(
    pool: &PgPool,
    household_id: Uuid,
    user_id: &str,
    item: &NewPantryItem,
) -> Result<PantryItem> {
    let row = pantry_db::upsert_pantry_item(
        pool,
        household_id,
        user_id,
        &item.ingredient_name,
        item.quantity,
        &item.unit,
        item.expires_at,
    )
    .await?;

    info!(
        household = %household_id,
        ingredient = %row.ingredient_name,
        unit = %row.unit,
        quantity = row.quantity,
        "pantry stock recorded"
    );
    Ok(row)
}

pub async fn list_pantry_items(pool: &PgPool, household_id: Uuid) -> Result<Vec<PantryItem>> {
    pantry_db::list_pantry_items(pool, household_id).await
}

/// Apply a partial edit. Returns `None` when the item does not exist in the
/// household.
pub async fn update_pantry_item(
    pool: &PgPool,
    household_id: Uuid,
    item_id: Uuid,
    user_id: &str,
    changes: &PantryChanges,
) -> Result<Option<PantryItem>> {
    pantry_db::update_pantry_item(
        pool,
        household_id,
        item_id,
        user_id,
        changes.quantity,
        changes.unit.as_deref(),
        changes.expires_at,
    )
    .await
}

/// Remove an item. Returns `false` when it does not exist in the household.
pub async fn delete_pantry_item(pool: &PgPool, household_id: Uuid, item_id: Uuid) -> Result<bool> {
    let deleted = pantry_db::delete_pantry_item(pool, household_id, item_id).await?;
    if deleted {
        info!(household = %household_id, item = %item_id, "pantry item removed");
    }
    Ok(deleted)
}
