//! Fleet records.

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ACTIVE;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// A bus in the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: i64,
    pub bus_number: String,
    /// Seated capacity, always positive.
    pub capacity: i64,
    pub model: String,
    pub registration_number: String,
    pub status: String,
    pub created_at: i64,
}

/// Fields accepted when registering a bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBus {
    pub bus_number: String,
    pub capacity: i64,
    pub model: String,
    pub registration_number: String,
}

/// A partial update. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusUpdate {
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn check_capacity(capacity: i64) -> StoreResult<()> {
    if capacity <= 0 {
        return Err(StoreError::InvalidArgument(format!(
            "capacity must be positive, got {capacity}"
        )));
    }
    Ok(())
}

const BUS_COLUMNS: &str =
    "id, bus_number, capacity, model, registration_number, status, created_at";

fn bus_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bus> {
    Ok(Bus {
        id: row.get(0)?,
        bus_number: row.get(1)?,
        capacity: row.get(2)?,
        model: row.get(3)?,
        registration_number: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// CRUD operations on buses.
#[derive(Clone)]
pub struct BusStore {
    db: Database,
}

impl BusStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a bus with `status = "active"`.
    #[instrument(skip(self, new), fields(bus_number = %new.bus_number))]
    pub async fn create(&self, new: NewBus) -> StoreResult<Bus> {
        if new.bus_number.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "bus_number must not be empty".into(),
            ));
        }
        check_capacity(new.capacity)?;
        let now = Utc::now().timestamp();

        let bus = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO buses \
                     (bus_number, capacity, model, registration_number, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        new.bus_number,
                        new.capacity,
                        new.model,
                        new.registration_number,
                        ACTIVE,
                        now
                    ],
                )
                .map_err(|e| StoreError::from_write(e, "bus"))?;
                Ok(Bus {
                    id: conn.last_insert_rowid(),
                    bus_number: new.bus_number,
                    capacity: new.capacity,
                    model: new.model,
                    registration_number: new.registration_number,
                    status: ACTIVE.to_string(),
                    created_at: now,
                })
            })
            .await?;

        debug!(bus_id = bus.id, "bus created");
        Ok(bus)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<Bus>> {
        self.db
            .execute(move |conn| {
                let bus = conn
                    .query_row(
                        &format!("SELECT {BUS_COLUMNS} FROM buses WHERE id = ?1"),
                        rusqlite::params![id],
                        bus_from_row,
                    )
                    .optional()?;
                Ok(bus)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_by_number(&self, bus_number: &str) -> StoreResult<Option<Bus>> {
        let bus_number = bus_number.to_string();
        self.db
            .execute(move |conn| {
                let bus = conn
                    .query_row(
                        &format!("SELECT {BUS_COLUMNS} FROM buses WHERE bus_number = ?1"),
                        rusqlite::params![bus_number],
                        bus_from_row,
                    )
                    .optional()?;
                Ok(bus)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<Bus>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {BUS_COLUMNS} FROM buses ORDER BY id ASC LIMIT ?1 OFFSET ?2"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![limit, skip], bus_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Apply a partial update. Returns `None` if no bus has this id.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: BusUpdate) -> StoreResult<Option<Bus>> {
        if let Some(capacity) = update.capacity {
            check_capacity(capacity)?;
        }
        if let Some(status) = &update.status
            && status.trim().is_empty()
        {
            return Err(StoreError::InvalidArgument("status must not be empty".into()));
        }

        self.db
            .execute(move |conn| {
                // COALESCE keeps the stored value for every NULL parameter.
                let updated = conn
                    .execute(
                        "UPDATE buses SET \
                         capacity = COALESCE(?2, capacity), \
                         model = COALESCE(?3, model), \
                         status = COALESCE(?4, status) \
                         WHERE id = ?1",
                        rusqlite::params![id, update.capacity, update.model, update.status],
                    )
                    .map_err(|e| StoreError::from_write(e, "bus"))?;
                if updated == 0 {
                    return Ok(None);
                }
                let bus = conn.query_row(
                    &format!("SELECT {BUS_COLUMNS} FROM buses WHERE id = ?1"),
                    rusqlite::params![id],
                    bus_from_row,
                )?;
                debug!(bus_id = id, status = %bus.status, "bus updated");
                Ok(Some(bus))
            })
            .await
    }

    /// Delete a bus. Returns `false` if no such bus exists.
    ///
    /// Drivers assigned to the bus are unassigned. A bus that still has
    /// schedules or location pings yields [`StoreError::Conflict`].
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.db
            .execute(move |conn| {
                let deleted = conn
                    .execute("DELETE FROM buses WHERE id = ?1", rusqlite::params![id])
                    .map_err(|e| StoreError::from_delete(e, "bus"))?;
                Ok(deleted > 0)
            })
            .await
    }

    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM buses", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }

    /// Count buses whose status equals `status`.
    pub async fn count_by_status(&self, status: &str) -> StoreResult<i64> {
        let status = status.to_string();
        self.db
            .execute(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM buses WHERE status = ?1",
                    rusqlite::params![status],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> BusStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        BusStore::new(db)
    }

    fn new_bus(number: &str, registration: &str) -> NewBus {
        NewBus {
            bus_number: number.into(),
            capacity: 50,
            model: "Volvo B8R".into(),
            registration_number: registration.into(),
        }
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let store = setup_store().await;
        let bus = store.create(new_bus("BUS-001", "TN-58-A-1")).await.unwrap();
        assert_eq!(bus.status, "active");

        assert_eq!(store.get(bus.id).await.unwrap().unwrap(), bus);
        assert_eq!(
            store.get_by_number("BUS-001").await.unwrap().unwrap().id,
            bus.id
        );
        assert!(store.get_by_number("BUS-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_positive_capacity_rejected() {
        let store = setup_store().await;
        let mut bus = new_bus("BUS-001", "TN-58-A-1");
        bus.capacity = 0;
        assert!(matches!(
            store.create(bus).await,
            Err(StoreError::InvalidArgument(_))
        ));

        let created = store.create(new_bus("BUS-002", "TN-58-A-2")).await.unwrap();
        let update = BusUpdate {
            capacity: Some(-3),
            ..Default::default()
        };
        assert!(store.update(created.id, update).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let store = setup_store().await;
        store.create(new_bus("BUS-001", "TN-58-A-1")).await.unwrap();
        match store.create(new_bus("BUS-002", "TN-58-A-1")).await {
            Err(StoreError::Conflict { message, .. }) => {
                assert!(message.contains("registration_number"), "got: {message}")
            }
            other => panic!("expected Conflict, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn partial_update_keeps_unset_fields() {
        let store = setup_store().await;
        let bus = store.create(new_bus("BUS-001", "TN-58-A-1")).await.unwrap();

        let updated = store
            .update(
                bus.id,
                BusUpdate {
                    status: Some("maintenance".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, "maintenance");
        assert_eq!(updated.capacity, 50);
        assert_eq!(updated.model, "Volvo B8R");

        assert_eq!(store.count_by_status("active").await.unwrap(), 0);
        assert_eq!(store.count_by_status("maintenance").await.unwrap(), 1);
        assert!(store.update(999, BusUpdate::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_bus_leaves_count() {
        let store = setup_store().await;
        store.create(new_bus("BUS-001", "TN-58-A-1")).await.unwrap();
        assert!(!store.delete(999).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
