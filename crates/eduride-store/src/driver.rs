//! Driver accounts.
//!
//! Drivers log in by email and may be assigned one bus. `email` and
//! `license_number` are unique.

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ACTIVE;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::password::hash_password_async;

/// A driver account, without its password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    /// Bus the driver operates, if assigned.
    pub bus_id: Option<i64>,
    pub status: String,
    pub created_at: i64,
}

/// Fields accepted when creating a driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDriver {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    pub password: String,
    #[serde(default)]
    pub bus_id: Option<i64>,
}

impl NewDriver {
    fn validate(&self) -> StoreResult<()> {
        validate_identity(&self.email, &self.license_number)
    }
}

/// Fields accepted when editing a driver. A missing `password` or `phone`
/// keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverUpdate {
    pub name: String,
    pub email: String,
    pub license_number: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub bus_id: Option<i64>,
}

fn validate_identity(email: &str, license_number: &str) -> StoreResult<()> {
    if email.trim().is_empty() {
        return Err(StoreError::InvalidArgument("email must not be empty".into()));
    }
    if license_number.trim().is_empty() {
        return Err(StoreError::InvalidArgument(
            "license_number must not be empty".into(),
        ));
    }
    Ok(())
}

const DRIVER_COLUMNS: &str =
    "id, name, email, phone, license_number, bus_id, status, created_at";

fn driver_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        license_number: row.get(4)?,
        bus_id: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// CRUD operations on driver accounts.
#[derive(Clone)]
pub struct DriverStore {
    db: Database,
}

impl DriverStore {
    /// Create a new driver store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a driver with `status = "active"`.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create(&self, new: NewDriver) -> StoreResult<Driver> {
        new.validate()?;
        let password_hash = hash_password_async(new.password.clone()).await?;
        let now = Utc::now().timestamp();

        let driver = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO drivers \
                     (name, email, phone, license_number, password_hash, bus_id, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        new.name,
                        new.email,
                        new.phone,
                        new.license_number,
                        password_hash,
                        new.bus_id,
                        ACTIVE,
                        now
                    ],
                )
                .map_err(|e| StoreError::from_write(e, "driver"))?;
                Ok(Driver {
                    id: conn.last_insert_rowid(),
                    name: new.name,
                    email: new.email,
                    phone: new.phone,
                    license_number: new.license_number,
                    bus_id: new.bus_id,
                    status: ACTIVE.to_string(),
                    created_at: now,
                })
            })
            .await?;

        debug!(driver_id = driver.id, "driver created");
        Ok(driver)
    }

    /// Fetch a driver by id, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<Driver>> {
        self.db
            .execute(move |conn| {
                let driver = conn
                    .query_row(
                        &format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = ?1"),
                        rusqlite::params![id],
                        driver_from_row,
                    )
                    .optional()?;
                Ok(driver)
            })
            .await
    }

    /// Fetch a driver by email, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> StoreResult<Option<Driver>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                let driver = conn
                    .query_row(
                        &format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE email = ?1"),
                        rusqlite::params![email],
                        driver_from_row,
                    )
                    .optional()?;
                Ok(driver)
            })
            .await
    }

    /// Fetch a driver together with the stored password hash.
    #[instrument(skip(self))]
    pub async fn credentials(&self, email: &str) -> StoreResult<Option<(Driver, String)>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                let found = conn
                    .query_row(
                        &format!(
                            "SELECT {DRIVER_COLUMNS}, password_hash FROM drivers WHERE email = ?1"
                        ),
                        rusqlite::params![email],
                        |row| Ok((driver_from_row(row)?, row.get::<_, String>(8)?)),
                    )
                    .optional()?;
                Ok(found)
            })
            .await
    }

    /// List drivers in creation order.
    #[instrument(skip(self))]
    pub async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<Driver>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {DRIVER_COLUMNS} FROM drivers ORDER BY id ASC LIMIT ?1 OFFSET ?2"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![limit, skip], driver_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Edit a driver, re-hashing the password only when one is given.
    ///
    /// Returns `None` if no driver has this id.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: DriverUpdate) -> StoreResult<Option<Driver>> {
        validate_identity(&update.email, &update.license_number)?;
        let password_hash = match update.password.filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password_async(password).await?),
            None => None,
        };

        self.db
            .execute(move |conn| {
                let updated = conn
                    .execute(
                        "UPDATE drivers SET name = ?2, email = ?3, phone = COALESCE(?4, phone), \
                         license_number = ?5, password_hash = COALESCE(?6, password_hash), \
                         bus_id = ?7 WHERE id = ?1",
                        rusqlite::params![
                            id,
                            update.name,
                            update.email,
                            update.phone,
                            update.license_number,
                            password_hash,
                            update.bus_id
                        ],
                    )
                    .map_err(|e| StoreError::from_write(e, "driver"))?;
                if updated == 0 {
                    return Ok(None);
                }
                let driver = conn.query_row(
                    &format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = ?1"),
                    rusqlite::params![id],
                    driver_from_row,
                )?;
                Ok(Some(driver))
            })
            .await
    }

    /// Delete a driver. Returns `false` if no such driver exists.
    ///
    /// A driver with recorded location pings cannot be deleted and yields
    /// [`StoreError::Conflict`].
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.db
            .execute(move |conn| {
                let deleted = conn
                    .execute("DELETE FROM drivers WHERE id = ?1", rusqlite::params![id])
                    .map_err(|e| StoreError::from_delete(e, "driver"))?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Return the total number of drivers.
    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM drivers", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
