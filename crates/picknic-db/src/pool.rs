//! Connection pool, embedded schema, and the bootstrap steps behind
//! `picknic db-init`.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/picknic-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables owned by the picknic schema, parents before children.
pub const TABLES: [&str; 9] = [
    "households",
    "recipes",
    "recipe_ingredients",
    "recipe_steps",
    "meal_plans",
    "meal_plan_entries",
    "pantry_items",
    "shopping_lists",
    "shopping_list_items",
];

/// Row count of one schema table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: i64,
}

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!(migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}

/// The database name from `config`, if it is safe to splice into
/// `CREATE DATABASE` (which takes no bind parameters).
pub fn creatable_database_name(config: &DbConfig) -> Result<&str> {
    let name = config
        .database_name()
        .context("could not determine database name from URL")?;
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("database name {name:?} may only contain ASCII letters, digits and '_'");
    }
    Ok(name)
}

/// Create the target database through the `postgres` maintenance database
/// unless it already exists. Returns `true` when it was created.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let name = creatable_database_name(config)?;
    let maintenance_url = config.maintenance_url();

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&maintenance_url)
        .await
        .with_context(|| format!("failed to connect to maintenance database at {maintenance_url}"))?;

    let result = async {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(name)
                .fetch_one(&admin)
                .await
                .context("failed to query pg_database")?;
        if exists {
            return Ok(false);
        }
        admin
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .with_context(|| format!("failed to create database {name}"))?;
        Ok::<_, anyhow::Error>(true)
    }
    .await;
    admin.close().await;

    let created = result?;
    info!(db = name, created, "database ready");
    Ok(created)
}

/// Count the rows of every picknic table in one round trip, in [`TABLES`]
/// order.
pub async fn row_counts(pool: &PgPool) -> Result<Vec<TableCount>> {
    // Table names are compile-time constants.
    let query = TABLES
        .iter()
        .enumerate()
        .map(|(pos, table)| format!("SELECT {pos}::int AS pos, COUNT(*) AS n FROM {table}"))
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
        + " ORDER BY pos";

    let rows: Vec<(i32, i64)> = sqlx::query_as(&query)
        .fetch_all(pool)
        .await
        .context("failed to count rows")?;

    rows.into_iter()
        .map(|(pos, rows)| -> Result<TableCount> {
            let table = usize::try_from(pos)
                .ok()
                .and_then(|i| TABLES.get(i).copied())
                .with_context(|| format!("unexpected table position {pos}"))?;
            Ok(TableCount { table, rows })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creatable_name_accepts_plain_identifiers() {
        let config = DbConfig::new("postgresql://localhost:5432/picknic_dev?sslmode=disable");
        assert_eq!(creatable_database_name(&config).unwrap(), "picknic_dev");
    }

    #[test]
    fn creatable_name_rejects_sql_metacharacters() {
        let config = DbConfig::new("postgresql://localhost:5432/meals;DROP");
        let err = creatable_database_name(&config).unwrap_err();
        assert!(err.to_string().contains("meals;DROP"));
    }

    #[test]
    fn creatable_name_requires_a_path() {
        assert!(creatable_database_name(&DbConfig::new("postgresql://localhost:5432/")).is_err());
    }
}
