//! Database query functions for the `households` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Household;

/// Insert a new household.
pub async fn insert_household(
    pool: &PgPool,
    name: &str,
    external_org_id: Option<&str>,
) -> Result<Household> {
    let household = sqlx::query_as::<_, Household>(
        "INSERT INTO households (name, external_org_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(external_org_id)
    .fetch_one(pool)
    .await
    .context("failed to insert household")?;

    Ok(household)
}

/// Fetch a household by its ID.
pub async fn get_household(pool: &PgPool, id: Uuid) -> Result<Option<Household>> {
    let household = sqlx::query_as::<_, Household>("SELECT * FROM households WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch household")?;

    Ok(household)
}

/// Resolve a household from the identity provider's organization id.
pub async fn get_household_by_org(pool: &PgPool, external_org_id: &str) -> Result<Option<Household>> {
    let household =
        sqlx::query_as::<_, Household>("SELECT * FROM households WHERE external_org_id = $1")
            .bind(external_org_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch household by organization")?;

    Ok(household)
}

/// List all households, oldest first.
pub async fn list_households(pool: &PgPool) -> Result<Vec<Household>> {
    let households =
        sqlx::query_as::<_, Household>("SELECT * FROM households ORDER BY created_at, name")
            .fetch_all(pool)
            .await
            .context("failed to list households")?;

    Ok(households)
}
