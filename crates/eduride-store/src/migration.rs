//! Schema migration system.
//!
//! Migrations are stored as static SQL strings keyed by version number.
//! The current version is tracked in a `_migrations` table so migrations
//! are idempotent and only run once.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// A single migration definition.
struct Migration {
    /// Monotonically increasing version number (1, 2, 3, ...).
    version: u32,
    /// Human-readable description.
    description: &'static str,
    /// Raw SQL to execute. May contain multiple statements separated by `;`.
    sql: &'static str,
}

/// All migrations in order. Add new migrations to the end of this array.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial schema: accounts, fleet, routes and stops",
        sql: r#"
            CREATE TABLE admins (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                username      TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name          TEXT NOT NULL,
                created_at    INTEGER NOT NULL
            );

            CREATE TABLE routes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                route_name  TEXT NOT NULL,
                description TEXT,
                status      TEXT NOT NULL DEFAULT 'active',
                created_at  INTEGER NOT NULL
            );
            CREATE INDEX idx_routes_name ON routes(route_name);

            CREATE TABLE route_stops (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                route_id   INTEGER NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
                stop_name  TEXT NOT NULL,
                latitude   REAL NOT NULL,
                longitude  REAL NOT NULL,
                stop_order INTEGER NOT NULL,
                UNIQUE(route_id, stop_order)
            );
            CREATE INDEX idx_route_stops_route ON route_stops(route_id);

            CREATE TABLE buses (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                bus_number          TEXT NOT NULL UNIQUE,
                capacity            INTEGER NOT NULL CHECK(capacity > 0),
                model               TEXT NOT NULL,
                registration_number TEXT NOT NULL UNIQUE,
                status              TEXT NOT NULL DEFAULT 'active',
                created_at          INTEGER NOT NULL
            );

            CREATE TABLE students (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT NOT NULL,
                email         TEXT NOT NULL UNIQUE,
                roll_number   TEXT NOT NULL UNIQUE,
                phone         TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                route_id      INTEGER REFERENCES routes(id) ON DELETE SET NULL,
                status        TEXT NOT NULL DEFAULT 'active',
                created_at    INTEGER NOT NULL
            );
            CREATE INDEX idx_students_route ON students(route_id);

            CREATE TABLE drivers (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                name           TEXT NOT NULL,
                email          TEXT NOT NULL UNIQUE,
                phone          TEXT NOT NULL,
                license_number TEXT NOT NULL UNIQUE,
                password_hash  TEXT NOT NULL,
                bus_id         INTEGER REFERENCES buses(id) ON DELETE SET NULL,
                status         TEXT NOT NULL DEFAULT 'active',
                created_at     INTEGER NOT NULL
            );
            CREATE INDEX idx_drivers_bus ON drivers(bus_id);
        "#,
    },
    Migration {
        version: 2,
        description: "schedules, feedback and location pings",
        sql: r#"
            CREATE TABLE schedules (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                bus_id         INTEGER NOT NULL REFERENCES buses(id),
                route_id       INTEGER NOT NULL REFERENCES routes(id),
                departure_time TEXT NOT NULL,
                days_of_week   TEXT NOT NULL,
                status         TEXT NOT NULL DEFAULT 'active',
                created_at     INTEGER NOT NULL
            );
            CREATE INDEX idx_schedules_bus ON schedules(bus_id);
            CREATE INDEX idx_schedules_route ON schedules(route_id);

            CREATE TABLE feedbacks (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    INTEGER NOT NULL,
                user_type  TEXT NOT NULL CHECK(user_type IN ('student','driver','admin')),
                rating     INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
                category   TEXT NOT NULL,
                message    TEXT NOT NULL,
                status     TEXT NOT NULL DEFAULT 'pending',
                created_at INTEGER NOT NULL
            );
            CREATE INDEX idx_feedbacks_category ON feedbacks(category);

            CREATE TABLE locations (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                bus_id    INTEGER NOT NULL REFERENCES buses(id),
                driver_id INTEGER NOT NULL REFERENCES drivers(id),
                latitude  REAL NOT NULL,
                longitude REAL NOT NULL,
                speed     REAL,
                timestamp INTEGER NOT NULL
            );
            CREATE INDEX idx_locations_bus_time ON locations(bus_id, timestamp);
        "#,
    },
];

// ── public API ───────────────────────────────────────────────────────

/// Run all pending migrations against `conn`.
///
/// This is a **synchronous** function; call it from `spawn_blocking`.
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    ensure_migrations_table(conn)?;

    let current = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    if pending.is_empty() {
        debug!(current_version = current, "database schema is up to date");
        return Ok(());
    }

    info!(
        current_version = current,
        pending = pending.len(),
        "running pending migrations"
    );

    for migration in pending {
        apply(conn, migration)?;
    }

    info!(
        new_version = latest_version(),
        "all migrations applied"
    );
    Ok(())
}

/// Return the latest applied migration version, or 0 if none.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    ensure_migrations_table(conn)?;
    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Migration {
            version: 0,
            message: format!("failed to read current version: {e}"),
        })?;
    Ok(version)
}

/// The version the schema reaches once every migration has run.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

// ── internals ────────────────────────────────────────────────────────

/// Create the `_migrations` bookkeeping table if it does not exist.
fn ensure_migrations_table(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        );",
    )
    .map_err(|e| StoreError::Migration {
        version: 0,
        message: format!("failed to create _migrations table: {e}"),
    })?;
    Ok(())
}

/// Apply a single migration inside a transaction.
fn apply(conn: &Connection, migration: &Migration) -> StoreResult<()> {
    info!(
        version = migration.version,
        description = migration.description,
        "applying migration"
    );

    // `conn.transaction()` needs `&mut Connection`, so BEGIN/COMMIT by hand.
    conn.execute_batch("BEGIN IMMEDIATE;")
        .map_err(|e| StoreError::Migration {
            version: migration.version,
            message: format!("failed to begin transaction: {e}"),
        })?;

    let result = (|| -> StoreResult<()> {
        conn.execute_batch(migration.sql)
            .map_err(|e| StoreError::Migration {
                version: migration.version,
                message: format!("SQL execution failed: {e}"),
            })?;

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![migration.version, migration.description, now],
        )
        .map_err(|e| StoreError::Migration {
            version: migration.version,
            message: format!("failed to record migration: {e}"),
        })?;

        Ok(())
    })();

    match &result {
        Ok(()) => {
            conn.execute_batch("COMMIT;")
                .map_err(|e| StoreError::Migration {
                    version: migration.version,
                    message: format!("failed to commit: {e}"),
                })?;
            info!(
                version = migration.version,
                "migration applied successfully"
            );
        }
        Err(err) => {
            warn!(version = migration.version, %err, "migration failed, rolling back");
            let _ = conn.execute_batch("ROLLBACK;");
        }
    }

    result
}

// ── tests ────────────────────────────────────────────────────────────
