mod config;
mod seed;
mod serve;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use mealtrack_core::token::{Role, generate_token};
use mealtrack_db::pool;

use config::MealtrackConfig;

#[derive(Parser)]
#[command(name = "mealtrack", about = "Diet-tracking backend service")]
struct Cli {
    /// Database URL (overrides MEALTRACK_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealtrack config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/mealtrack")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the mealtrack database (requires config file or env vars)
    DbInit,
    /// Seed an immutable template plan from a TOML definition file
    Seed {
        /// Path to the template TOML file
        file: PathBuf,
    },
    /// Mint a bearer token for a user
    Token {
        /// User UUID the token authenticates
        user_id: String,
        /// Grant the admin role (required for the data-migration route)
        #[arg(long)]
        admin: bool,
    },
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Execute the `mealtrack init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            token_secret: token_secret.clone(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  auth.token_secret = {}...{}",
        &token_secret[..8],
        &token_secret[56..]
    );
    println!();
    println!("Next: run `mealtrack db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `mealtrack db-init` command: create database and run
/// migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = MealtrackConfig::resolve(cli_db_url)?;

    println!("Initializing mealtrack database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("mealtrack db-init complete.");
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
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Seed { file } => {
            let resolved = MealtrackConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = seed::seed_template_from_file(&db_pool, &file).await;
            db_pool.close().await;
            let plan = result?;
            println!("Template {:?} seeded with id {}", plan.name, plan.id);
        }
        Commands::Token { user_id, admin } => {
            let resolved = MealtrackConfig::resolve(cli.database_url.as_deref())?;
            let user_id = uuid::Uuid::parse_str(&user_id)
                .with_context(|| format!("invalid user ID: {user_id}"))?;
            let role = if admin { Role::Admin } else { Role::User };
            let token = generate_token(&resolved.token_config, user_id, role);
            println!("{token}");
        }
        Commands::Serve { bind, port } => {
            let resolved = MealtrackConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let state = serve::AppState {
                pool: db_pool.clone(),
                tokens: resolved.token_config,
            };
            let result = serve::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
