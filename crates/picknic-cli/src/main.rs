mod config;
mod household_cmds;
mod pantry_cmds;
mod plan_cmds;
mod recipe_cmds;
mod resolve;
mod serve_cmd;
mod shopping_cmds;

use clap::{CommandFactory, Parser, Subcommand};

use picknic_db::pool;

use config::PicknicConfig;

#[derive(Parser)]
#[command(name = "picknic", about = "Household meal planning and pantry-aware shopping lists")]
struct Cli {
    /// Database URL (overrides PICKNIC_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// User ID recorded on rows this invocation creates or edits
    #[arg(long, global = true, env = "PICKNIC_USER", default_value = "cli")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a picknic config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/picknic")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the picknic database if needed and apply migrations
    DbInit,
    /// Household management
    Household {
        #[command(subcommand)]
        command: HouseholdCommands,
    },
    /// Recipe management
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Weekly meal plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Pantry stock
    Pantry {
        #[command(subcommand)]
        command: PantryCommands,
    },
    /// Shopping lists derived from meal plans
    Shopping {
        #[command(subcommand)]
        command: ShoppingCommands,
    },
    /// Serve the JSON API over HTTP
    Serve {
        /// Address to bind (defaults to [server].bind, then 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (defaults to [server].port, then 3000)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print shell completions to stdout
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum HouseholdCommands {
    /// Create a household
    Create {
        name: String,
        /// Organization ID in the external identity provider
        #[arg(long)]
        org: Option<String>,
    },
    /// List households
    List,
}

#[derive(Subcommand)]
pub enum RecipeCommands {
    /// Add a recipe from a TOML file
    Add {
        /// Path to the recipe TOML file
        file: String,
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
    /// List the household's recipes
    List {
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
    /// Show one recipe with ingredients and steps
    Show {
        recipe_id: String,
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
    /// Delete a recipe
    Delete {
        recipe_id: String,
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Save meal plan entries from a TOML file
    Set {
        /// Path to the meal plan TOML file
        file: String,
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
    /// Show the plan for a week
    Show {
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
        /// Any date in the week (defaults to the current week)
        #[arg(long)]
        week: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PantryCommands {
    /// Record stock (replaces any existing row with the same name and unit)
    Add {
        name: String,
        quantity: f64,
        unit: String,
        /// Expiry date (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<String>,
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
    /// List pantry stock
    List {
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
    /// Remove a pantry item
    Remove {
        item_id: String,
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
}

#[derive(Subcommand)]
pub enum ShoppingCommands {
    /// Rebuild the week's generated items from the meal plan and pantry
    Generate {
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
        /// Any date in the week (defaults to the current week)
        #[arg(long)]
        week: Option<String>,
    },
    /// Show the week's shopping list
    Show {
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
        #[arg(long)]
        week: Option<String>,
    },
    /// Add an item by hand
    Add {
        name: String,
        #[arg(long)]
        quantity: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
        #[arg(long)]
        week: Option<String>,
    },
    /// Mark an item as bought, skipped or pending
    Mark {
        item_id: String,
        /// pending, bought or skipped
        status: String,
        #[arg(long, env = "PICKNIC_HOUSEHOLD")]
        household: String,
    },
}

/// Execute the `picknic init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        server: config::ServerSection::default(),
    };
    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server       = {}:{}", cfg.server.bind, cfg.server.port);
    println!();
    println!("Next: run `picknic db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `picknic db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = PicknicConfig::resolve(cli_db_url)?;

    println!("Initializing picknic database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database.");
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let result = async {
        pool::run_migrations(&db_pool).await?;
        pool::row_counts(&db_pool).await
    }
    .await;
    db_pool.close().await;

    println!("Database ready. Tables:");
    for count in &result? {
        println!("  {:<20} {} rows", count.table, count.rows);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => cmd_init(&db_url, force)?,
        Commands::DbInit => cmd_db_init(cli.database_url.as_deref()).await?,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "picknic",
                &mut std::io::stdout(),
            );
        }
        Commands::Serve { bind, port } => {
            let resolved = PicknicConfig::resolve(cli.database_url.as_deref())?;
            let bind = bind.unwrap_or(resolved.server.bind);
            let port = port.unwrap_or(resolved.server.port);
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = serve_cmd::run_serve(db_pool.clone(), &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::Household { command } => {
            let resolved = PicknicConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = household_cmds::run_household_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Recipe { command } => {
            let resolved = PicknicConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = recipe_cmds::run_recipe_command(command, &db_pool, &cli.user).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = PicknicConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool, &cli.user).await;
            db_pool.close().await;
            result?;
        }
        Commands::Pantry { command } => {
            let resolved = PicknicConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = pantry_cmds::run_pantry_command(command, &db_pool, &cli.user).await;
            db_pool.close().await;
            result?;
        }
        Commands::Shopping { command } => {
            let resolved = PicknicConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = shopping_cmds::run_shopping_command(command, &db_pool, &cli.user).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::path::Path;
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that touch process-wide environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with `XDG_CONFIG_HOME` pointed at `dir`, restoring it after.
    /// Callers must hold [`lock_env`].
    pub fn with_config_home<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir) };
        let result = f();
        match original {
            Some(value) => unsafe { std::env::set_var("XDG_CONFIG_HOME", value) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        result
    }
}
