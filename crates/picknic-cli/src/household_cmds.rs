//! CLI handlers for `picknic household` subcommands.

use anyhow::Result;
use sqlx::PgPool;

use picknic_db::queries::households as household_db;

use crate::HouseholdCommands;

pub async fn run_household_command(command: HouseholdCommands, pool: &PgPool) -> Result<()> {
    match command {
        HouseholdCommands::Create { name, org } => cmd_create(pool, &name, org.as_deref()).await,
        HouseholdCommands::List => cmd_list(pool).await,
    }
}

async fn cmd_create(pool: &PgPool, name: &str, org: Option<&str>) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("household name must not be blank");
    }

    if let Some(org_id) = org {
        if let Some(existing) = household_db::get_household_by_org(pool, org_id).await? {
            anyhow::bail!(
                "organization {org_id:?} already has household {} ({})",
                existing.id,
                existing.name
            );
        }
    }

    let household = household_db::insert_household(pool, name, org).await?;

    println!("Household created.");
    println!();
    println!("  ID:   {}", household.id);
    println!("  Name: {}", household.name);
    if let Some(org_id) = &household.external_org_id {
        println!("  Org:  {org_id}");
    }
    println!();
    println!("Tip: export PICKNIC_HOUSEHOLD={} to skip --household.", household.id);
    Ok(())
}

async fn cmd_list(pool: &PgPool) -> Result<()> {
    let households = household_db::list_households(pool).await?;

    if households.is_empty() {
        println!("No households found. Use `picknic household create <name>` to add one.");
        return Ok(());
    }

    let name_w = households
        .iter()
        .map(|h| h.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<36}  {:<name_w$}  ORG", "ID", "NAME");
    for household in &households {
        println!(
            "{:<36}  {:<name_w$}  {}",
            household.id,
            household.name,
            household.external_org_id.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
