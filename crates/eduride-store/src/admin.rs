//! Administrator accounts.
//!
//! Admins log in by username. Passwords are hashed with
//! [`crate::password::hash_password_async`] before they reach the database, and
//! the hash never leaves this crate except through [`AdminStore::credentials`].

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::password::hash_password_async;

/// An administrator account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Unix timestamp when the account was created.
    pub created_at: i64,
}

const ADMIN_COLUMNS: &str = "id, username, name, created_at";

fn admin_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// CRUD operations on administrator accounts.
#[derive(Clone)]
pub struct AdminStore {
    db: Database,
}

impl AdminStore {
    /// Create a new admin store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new admin account.
    ///
    /// Returns [`StoreError::Conflict`] if the username is already taken.
    #[instrument(skip(self, password))]
    pub async fn create(&self, username: &str, password: &str, name: &str) -> StoreResult<Admin> {
        if username.is_empty() {
            return Err(StoreError::InvalidArgument(
                "username must not be empty".into(),
            ));
        }

        let password_hash = hash_password_async(password.to_string()).await?;
        let username = username.to_string();
        let name = name.to_string();
        let now = Utc::now().timestamp();

        let admin = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO admins (username, password_hash, name, created_at) \
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![username, password_hash, name, now],
                )
                .map_err(|e| StoreError::from_write(e, "admin"))?;
                Ok(Admin {
                    id: conn.last_insert_rowid(),
                    username,
                    name,
                    created_at: now,
                })
            })
            .await?;

        debug!(admin_id = admin.id, username = %admin.username, "admin created");
        Ok(admin)
    }

    /// Fetch an admin by id, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<Admin>> {
        self.db
            .execute(move |conn| {
                let admin = conn
                    .query_row(
                        &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?1"),
                        rusqlite::params![id],
                        admin_from_row,
                    )
                    .optional()?;
                Ok(admin)
            })
            .await
    }

    /// Fetch an admin by username, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        let username = username.to_string();
        self.db
            .execute(move |conn| {
                let admin = conn
                    .query_row(
                        &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE username = ?1"),
                        rusqlite::params![username],
                        admin_from_row,
                    )
                    .optional()?;
                Ok(admin)
            })
            .await
    }

    /// Fetch an admin together with the stored password hash.
    ///
    /// Only the login path should need this.
    #[instrument(skip(self))]
    pub async fn credentials(&self, username: &str) -> StoreResult<Option<(Admin, String)>> {
        let username = username.to_string();
        self.db
            .execute(move |conn| {
                let found = conn
                    .query_row(
                        &format!(
                            "SELECT {ADMIN_COLUMNS}, password_hash FROM admins WHERE username = ?1"
                        ),
                        rusqlite::params![username],
                        |row| Ok((admin_from_row(row)?, row.get::<_, String>(4)?)),
                    )
                    .optional()?;
                Ok(found)
            })
            .await
    }

    /// List admins in creation order.
    #[instrument(skip(self))]
    pub async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<Admin>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY id ASC LIMIT ?1 OFFSET ?2"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![limit, skip], admin_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Delete an admin. Returns `false` if no such admin exists.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.db
            .execute(move |conn| {
                let deleted = conn
                    .execute("DELETE FROM admins WHERE id = ?1", rusqlite::params![id])
                    .map_err(|e| StoreError::from_delete(e, "admin"))?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Return the total number of admins.
    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
