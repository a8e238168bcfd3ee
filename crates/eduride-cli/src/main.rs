//! CLI entry point for EduRide.
//!
//! This binary provides the `eduride` command with subcommands for serving
//! the API, initializing the database, checking status and adding admins.

mod cli;
mod helpers;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;

use eduride_auth::TokenIssuer;
use eduride_store::{
    AdminStore, BusStore, DriverStore, FeedbackStore, RouteStore, ScheduleStore, StudentStore,
};
use eduride_web::WebServer;

use cli::{Cli, Commands, Overrides};
use helpers::{init_tracing, load_config, open_database, seed};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(&cli.overrides, host, port).await,
        Commands::InitDb => cmd_init_db(&cli.overrides).await,
        Commands::Status => cmd_status(&cli.overrides).await,
        Commands::CreateAdmin {
            username,
            password,
            name,
        } => cmd_create_admin(&cli.overrides, &username, &password, &name).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommand: serve
// ---------------------------------------------------------------------------

async fn cmd_serve(overrides: &Overrides, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(overrides)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    init_tracing(config.default_log_level());
    info!(app = %config.app_name, "starting EduRide");

    let db = open_database(&config).await?;
    seed(&db).await?;

    let tokens = TokenIssuer::new(
        config
            .token_config()
            .context("failed to prepare token signing")?,
    );
    let server = WebServer::new(config, db, tokens);
    server
        .start()
        .await
        .map_err(|e| anyhow!("web server error: {e}"))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: init-db
// ---------------------------------------------------------------------------

async fn cmd_init_db(overrides: &Overrides) -> Result<()> {
    let config = load_config(overrides)?;
    init_tracing(config.default_log_level());

    let db = open_database(&config).await?;
    seed(&db).await?;

    let version = db.schema_version().await.context("failed to read schema version")?;
    println!("Database ready at {} (schema version {version})", config.database_url);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

async fn cmd_status(overrides: &Overrides) -> Result<()> {
    let config = load_config(overrides)?;
    init_tracing("warn");

    println!("EduRide v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("  Configuration:");
    println!("    App name:      {}", config.app_name);
    println!("    API prefix:    {}", display_prefix(&config.api_prefix));
    println!("    Listen:        {}", config.addr());
    println!("    Database:      {}", config.database_url);
    println!("    CORS origins:  {}", config.cors_origins.join(", "));
    println!(
        "    JWT secret:    {}",
        if config.jwt_secret.is_some() { "set" } else { "random per process" }
    );
    println!("    Token TTL:     {} min", config.token_ttl_minutes);
    println!();

    let db = open_database(&config).await?;
    let version = db.schema_version().await.context("failed to read schema version")?;
    println!("  Schema version:  {version}");
    println!();

    println!("  Rows:");
    let counts = [
        ("admins", AdminStore::new(db.clone()).count().await),
        ("students", StudentStore::new(db.clone()).count().await),
        ("drivers", DriverStore::new(db.clone()).count().await),
        ("buses", BusStore::new(db.clone()).count().await),
        ("routes", RouteStore::new(db.clone()).count().await),
        ("schedules", ScheduleStore::new(db.clone()).count().await),
        ("feedback", FeedbackStore::new(db.clone()).count().await),
    ];
    for (table, count) in counts {
        let count = count.with_context(|| format!("failed to count {table}"))?;
        println!("    {table:<10} {count}");
    }

    Ok(())
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() { "(none)" } else { prefix }
}

// ---------------------------------------------------------------------------
// Subcommand: create-admin
// ---------------------------------------------------------------------------

async fn cmd_create_admin(
    overrides: &Overrides,
    username: &str,
    password: &str,
    name: &str,
) -> Result<()> {
    let config = load_config(overrides)?;
    init_tracing(config.default_log_level());

    let db = open_database(&config).await?;
    let admin = AdminStore::new(db)
        .create(username, password, name)
        .await
        .with_context(|| format!("failed to create admin {username:?}"))?;

    println!("Created admin {} (id {})", admin.username, admin.id);
    Ok(())
}
