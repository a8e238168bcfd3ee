//! Routes and their ordered stops.
//!
//! A route and its stops are always written together inside one
//! transaction, so a failure part-way through leaves no route behind.
//! Stops are returned sorted by `order`, which is unique within a route
//! and enforced both here and by `UNIQUE(route_id, stop_order)`.

use std::collections::HashSet;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ACTIVE;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// A route row without its stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub route_name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: i64,
}

/// One stop on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub id: i64,
    pub stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Position along the route, unique within the route.
    pub order: i64,
}

/// A route together with its stops, sorted by `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteWithStops {
    #[serde(flatten)]
    pub route: Route,
    pub stops: Vec<RouteStop>,
}

impl RouteWithStops {
    /// The stop with the highest `order`, if any.
    pub fn last_stop(&self) -> Option<&RouteStop> {
        self.stops.last()
    }

    /// The stop with the lowest `order`, if any.
    pub fn first_stop(&self) -> Option<&RouteStop> {
        self.stops.first()
    }
}

/// A stop as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStop {
    pub stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub order: i64,
}

/// Fields accepted when creating or replacing a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoute {
    pub route_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stops: Vec<NewStop>,
}

impl NewRoute {
    fn validate(&self) -> StoreResult<()> {
        if self.route_name.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "route_name must not be empty".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.stops.len());
        for stop in &self.stops {
            if !seen.insert(stop.order) {
                return Err(StoreError::InvalidArgument(format!(
                    "duplicate stop order {}",
                    stop.order
                )));
            }
            if !(-90.0..=90.0).contains(&stop.latitude)
                || !(-180.0..=180.0).contains(&stop.longitude)
            {
                return Err(StoreError::InvalidArgument(format!(
                    "stop {:?} has coordinates out of range",
                    stop.stop_name
                )));
            }
        }
        Ok(())
    }
}

const ROUTE_COLUMNS: &str = "id, route_name, description, status, created_at";

fn route_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Route> {
    Ok(Route {
        id: row.get(0)?,
        route_name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn load_stops(conn: &Connection, route_id: i64) -> StoreResult<Vec<RouteStop>> {
    let mut stmt = conn.prepare(
        "SELECT id, stop_name, latitude, longitude, stop_order FROM route_stops \
         WHERE route_id = ?1 ORDER BY stop_order ASC",
    )?;
    let stops = stmt
        .query_map(rusqlite::params![route_id], |row| {
            Ok(RouteStop {
                id: row.get(0)?,
                stop_name: row.get(1)?,
                latitude: row.get(2)?,
                longitude: row.get(3)?,
                order: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stops)
}

fn insert_stops(conn: &Connection, route_id: i64, stops: &[NewStop]) -> StoreResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO route_stops (route_id, stop_name, latitude, longitude, stop_order) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for stop in stops {
        stmt.execute(rusqlite::params![
            route_id,
            stop.stop_name,
            stop.latitude,
            stop.longitude,
            stop.order
        ])
        .map_err(|e| StoreError::from_write(e, "route stop"))?;
    }
    Ok(())
}

fn load_route(conn: &Connection, id: i64) -> StoreResult<Option<RouteWithStops>> {
    let route = conn
        .query_row(
            &format!("SELECT {ROUTE_COLUMNS} FROM routes WHERE id = ?1"),
            rusqlite::params![id],
            route_from_row,
        )
        .optional()?;
    match route {
        Some(route) => {
            let stops = load_stops(conn, route.id)?;
            Ok(Some(RouteWithStops { route, stops }))
        }
        None => Ok(None),
    }
}

/// CRUD operations on routes.
#[derive(Clone)]
pub struct RouteStore {
    db: Database,
}

impl RouteStore {
    /// Create a new route store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a route and all of its stops in one transaction.
    #[instrument(skip(self, new), fields(route_name = %new.route_name, stops = new.stops.len()))]
    pub async fn create(&self, new: NewRoute) -> StoreResult<RouteWithStops> {
        new.validate()?;
        let now = Utc::now().timestamp();

        let route = self
            .db
            .transaction(move |tx| {
                tx.execute(
                    "INSERT INTO routes (route_name, description, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![new.route_name, new.description, ACTIVE, now],
                )
                .map_err(|e| StoreError::from_write(e, "route"))?;
                let id = tx.last_insert_rowid();
                insert_stops(tx, id, &new.stops)?;

                load_route(tx, id)?.ok_or(StoreError::NotFound { entity: "route", id })
            })
            .await?;

        debug!(route_id = route.route.id, "route created");
        Ok(route)
    }

    /// Fetch a route with its stops, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<RouteWithStops>> {
        self.db.execute(move |conn| load_route(conn, id)).await
    }

    /// List routes in creation order, each with its stops.
    #[instrument(skip(self))]
    pub async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<RouteWithStops>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ROUTE_COLUMNS} FROM routes ORDER BY id ASC LIMIT ?1 OFFSET ?2"
                ))?;
                let routes = stmt
                    .query_map(rusqlite::params![limit, skip], route_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                routes
                    .into_iter()
                    .map(|route| {
                        let stops = load_stops(conn, route.id)?;
                        Ok(RouteWithStops { route, stops })
                    })
                    .collect()
            })
            .await
    }

    /// Replace a route's name, description and full stop list in one
    /// transaction. Returns `None` if no route has this id.
    #[instrument(skip(self, new))]
    pub async fn replace(&self, id: i64, new: NewRoute) -> StoreResult<Option<RouteWithStops>> {
        new.validate()?;

        self.db
            .transaction(move |tx| {
                let updated = tx
                    .execute(
                        "UPDATE routes SET route_name = ?2, description = ?3 WHERE id = ?1",
                        rusqlite::params![id, new.route_name, new.description],
                    )
                    .map_err(|e| StoreError::from_write(e, "route"))?;
                if updated == 0 {
                    return Ok(None);
                }

                tx.execute(
                    "DELETE FROM route_stops WHERE route_id = ?1",
                    rusqlite::params![id],
                )?;
                insert_stops(tx, id, &new.stops)?;
                debug!(route_id = id, stops = new.stops.len(), "route replaced");

                load_route(tx, id)
            })
            .await
    }

    /// Delete a route and its stops. Returns `false` if no such route exists.
    ///
    /// Students on the route are unassigned. A route that still has
    /// schedules yields [`StoreError::Conflict`].
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.db
            .execute(move |conn| {
                let deleted = conn
                    .execute("DELETE FROM routes WHERE id = ?1", rusqlite::params![id])
                    .map_err(|e| StoreError::from_delete(e, "route"))?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Return the total number of routes.
    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM routes", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }

    /// Return the number of stops stored for `route_id`.
    pub async fn stop_count(&self, route_id: i64) -> StoreResult<i64> {
        self.db
            .execute(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM route_stops WHERE route_id = ?1",
                    rusqlite::params![route_id],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
