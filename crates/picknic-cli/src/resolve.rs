//! Argument resolution shared by the command handlers.
//!
//! - [`parse_id`] turns a UUID argument into a [`Uuid`] with a readable error.
//! - [`week_arg`] turns `--week` (any date in the week) into that week's
//!   Monday, defaulting to the current UTC week.
//! - [`require_household`] checks the household exists before any write.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use picknic_core::week::{parse_date, week_start};
use picknic_db::models::Household;
use picknic_db::queries::households as household_db;

/// Parse a UUID argument, naming what it was supposed to identify.
pub fn parse_id(kind: &str, input: &str) -> Result<Uuid> {
    Uuid::parse_str(input.trim()).with_context(|| format!("invalid {kind} ID: {input:?}"))
}

/// Resolve `--week` against `today`.
///
/// Unlike the HTTP layer, which silently falls back to the current week, a
/// malformed date on the command line is an error.
pub fn week_arg_at(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match input {
        None => Ok(week_start(today)),
        Some(raw) => match parse_date(raw) {
            Some(date) => Ok(week_start(date)),
            None => bail!("invalid --week value {raw:?}; expected YYYY-MM-DD"),
        },
    }
}

pub fn week_arg(input: Option<&str>) -> Result<NaiveDate> {
    week_arg_at(input, Utc::now().date_naive())
}

/// Parse `--household` and make sure it names an existing household.
pub async fn require_household(pool: &PgPool, input: &str) -> Result<Household> {
    let id = parse_id("household", input)?;
    household_db::get_household(pool, id)
        .await?
        .with_context(|| format!("household {id} not found"))
}
