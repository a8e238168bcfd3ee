//! Shared helpers for the subcommands.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use eduride_store::{Database, seed_defaults};
use eduride_web::ServerConfig;

use crate::cli::Overrides;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Load `.env` (if any), read the environment, then apply CLI overrides.
pub fn load_config(overrides: &Overrides) -> Result<ServerConfig> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let mut config = ServerConfig::from_env().context("failed to read configuration")?;
    if let Some(url) = &overrides.database_url {
        config.database_url = url.clone();
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// Open the configured database and run pending migrations.
pub async fn open_database(config: &ServerConfig) -> Result<Database> {
    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    info!(url = %config.database_url, "store initialized");
    Ok(db)
}

/// Create any missing default accounts.
pub async fn seed(db: &Database) -> Result<()> {
    let report = seed_defaults(db)
        .await
        .context("failed to seed default accounts")?;
    if report.is_empty() {
        info!("default accounts already present");
    } else {
        info!(accounts = ?report.created, "default accounts created");
    }
    Ok(())
}
