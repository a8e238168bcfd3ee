//! CLI argument definitions for EduRide.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use clap::{Args, Parser, Subcommand};

/// EduRide -- campus bus tracking backend.
#[derive(Parser)]
#[command(
    name = "eduride",
    version,
    about = "EduRide -- campus bus tracking backend",
    long_about = "Serves the EduRide REST API for admins, students and drivers, \
                  and manages the SQLite database behind it."
)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that take precedence over the environment and `.env`.
#[derive(Args, Default)]
pub struct Overrides {
    /// SQLite connection string (`sqlite:///path.db`, a path, or `:memory:`).
    #[arg(long, global = true)]
    pub database_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Migrate, seed the default accounts and start the HTTP server.
    Serve {
        /// Address to bind the HTTP server to.
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on.
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Create the tables and default accounts, then exit.
    InitDb,

    /// Print the configuration, schema version and row counts.
    Status,

    /// Add an admin account.
    CreateAdmin {
        /// Login name for the new admin.
        username: String,

        /// Password for the new admin.
        #[arg(long, env = "EDURIDE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        /// Display name.
        #[arg(long, default_value = "Administrator")]
        name: String,
    },
}
