//! Append-only GPS pings reported by drivers.

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// One recorded position of a bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub bus_id: i64,
    pub driver_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// km/h, if the device reported it.
    pub speed: Option<f64>,
    /// Unix timestamp when the ping was stored.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLocation {
    pub bus_id: i64,
    pub driver_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed: Option<f64>,
}

const LOCATION_COLUMNS: &str = "id, bus_id, driver_id, latitude, longitude, speed, timestamp";

fn location_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        bus_id: row.get(1)?,
        driver_id: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        speed: row.get(5)?,
        timestamp: row.get(6)?,
    })
}

/// Location history per bus.
#[derive(Clone)]
pub struct LocationStore {
    db: Database,
}

impl LocationStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append a ping stamped with the current time.
    #[instrument(skip(self, new), fields(bus_id = new.bus_id, driver_id = new.driver_id))]
    pub async fn record(&self, new: NewLocation) -> StoreResult<Location> {
        if !(-90.0..=90.0).contains(&new.latitude) || !(-180.0..=180.0).contains(&new.longitude) {
            return Err(StoreError::InvalidArgument(format!(
                "coordinates out of range: ({}, {})",
                new.latitude, new.longitude
            )));
        }
        if let Some(speed) = new.speed
            && !(speed >= 0.0 && speed.is_finite())
        {
            return Err(StoreError::InvalidArgument(format!(
                "speed must be a non-negative number, got {speed}"
            )));
        }
        let now = Utc::now().timestamp();

        let location = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO locations (bus_id, driver_id, latitude, longitude, speed, timestamp) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        new.bus_id,
                        new.driver_id,
                        new.latitude,
                        new.longitude,
                        new.speed,
                        now
                    ],
                )
                .map_err(|e| StoreError::from_write(e, "location"))?;
                Ok(Location {
                    id: conn.last_insert_rowid(),
                    bus_id: new.bus_id,
                    driver_id: new.driver_id,
                    latitude: new.latitude,
                    longitude: new.longitude,
                    speed: new.speed,
                    timestamp: now,
                })
            })
            .await?;

        debug!(location_id = location.id, "location recorded");
        Ok(location)
    }

    /// The newest ping for `bus_id`, if any.
    #[instrument(skip(self))]
    pub async fn latest_for_bus(&self, bus_id: i64) -> StoreResult<Option<Location>> {
        self.db
            .execute(move |conn| {
                // Ties on the second-resolution timestamp fall back to insertion order.
                let location = conn
                    .query_row(
                        &format!(
                            "SELECT {LOCATION_COLUMNS} FROM locations WHERE bus_id = ?1 \
                             ORDER BY timestamp DESC, id DESC LIMIT 1"
                        ),
                        rusqlite::params![bus_id],
                        location_from_row,
                    )
                    .optional()?;
                Ok(location)
            })
            .await
    }

    /// Up to `limit` pings for `bus_id`, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_bus(&self, bus_id: i64, limit: i64) -> StoreResult<Vec<Location>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {LOCATION_COLUMNS} FROM locations WHERE bus_id = ?1 \
                     ORDER BY timestamp DESC, id DESC LIMIT ?2"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![bus_id, limit], location_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusStore, NewBus};
    use crate::driver::{DriverStore, NewDriver};

    async fn setup() -> (LocationStore, i64, i64, Database) {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();

        let bus = BusStore::new(db.clone())
            .create(NewBus {
                bus_number: "BUS-001".into(),
                capacity: 50,
                model: "Volvo".into(),
                registration_number: "TN-1".into(),
            })
            .await
            .unwrap();
        let driver = DriverStore::new(db.clone())
            .create(NewDriver {
                name: "Test Driver".into(),
                email: "driver@tce.edu".into(),
                phone: "9876543211".into(),
                license_number: "DL1".into(),
                password: "driver123".into(),
                bus_id: Some(bus.id),
            })
            .await
            .unwrap();

        (LocationStore::new(db.clone()), bus.id, driver.id, db)
    }

    fn ping(bus_id: i64, driver_id: i64, latitude: f64) -> NewLocation {
        NewLocation {
            bus_id,
            driver_id,
            latitude,
            longitude: 78.08,
            speed: Some(32.5),
        }
    }

    #[tokio::test]
    async fn latest_is_the_newest_ping() {
        let (store, bus_id, driver_id, _db) = setup().await;
        assert!(store.latest_for_bus(bus_id).await.unwrap().is_none());

        store.record(ping(bus_id, driver_id, 9.80)).await.unwrap();
        let second = store.record(ping(bus_id, driver_id, 9.81)).await.unwrap();

        let latest = store.latest_for_bus(bus_id).await.unwrap().unwrap();
        assert_eq!(latest, second);

        let history = store.list_for_bus(bus_id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
    }

    #[tokio::test]
    async fn invalid_pings_rejected() {
        let (store, bus_id, driver_id, _db) = setup().await;
        assert!(store.record(ping(bus_id, driver_id, 91.0)).await.is_err());

        let mut negative = ping(bus_id, driver_id, 9.8);
        negative.speed = Some(-1.0);
        assert!(store.record(negative).await.is_err());

        assert!(matches!(
            store.record(ping(999, driver_id, 9.8)).await,
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn driver_with_pings_cannot_be_deleted() {
        let (store, bus_id, driver_id, db) = setup().await;
        store.record(ping(bus_id, driver_id, 9.8)).await.unwrap();

        let drivers = DriverStore::new(db);
        assert!(matches!(
            drivers.delete(driver_id).await,
            Err(StoreError::Conflict { .. })
        ));
    }
}
