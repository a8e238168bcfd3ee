//! Bus departures on a route.
//!
//! `days_of_week` is kept as a comma-delimited column of canonical weekday
//! names (`Monday,Wednesday`). Input is accepted in any case and in the
//! short form (`mon`), and is normalized before it is stored.

use chrono::{NaiveTime, Utc, Weekday};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ACTIVE;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// A schedule joined with the bus number and route name it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDetail {
    pub id: i64,
    pub bus_id: i64,
    pub bus_number: String,
    pub route_id: i64,
    pub route_name: String,
    pub departure_time: String,
    pub days_of_week: Vec<String>,
    pub status: String,
    pub created_at: i64,
}

impl ScheduleDetail {
    /// Whether the schedule runs on `day`.
    pub fn runs_on(&self, day: Weekday) -> bool {
        let name = weekday_name(day);
        self.days_of_week.iter().any(|d| d == name)
    }

    pub fn is_active(&self) -> bool {
        self.status == ACTIVE
    }
}

/// Fields accepted when creating or replacing a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSchedule {
    pub bus_id: i64,
    pub route_id: i64,
    /// `HH:MM` or `HH:MM:SS`.
    pub departure_time: String,
    pub days_of_week: Vec<String>,
    /// Defaults to `active`.
    #[serde(default)]
    pub status: Option<String>,
}

impl NewSchedule {
    /// Validate and return `(departure_time, days_column, status)`.
    fn normalize(&self) -> StoreResult<(String, String, String)> {
        let parsed = parse_departure_time(&self.departure_time).ok_or_else(|| {
            StoreError::InvalidArgument(format!(
                "departure_time must be HH:MM or HH:MM AM/PM, got {:?}",
                self.departure_time
            ))
        })?;

        if self.days_of_week.is_empty() {
            return Err(StoreError::InvalidArgument(
                "days_of_week must name at least one day".into(),
            ));
        }
        let mut days: Vec<Weekday> = Vec::with_capacity(self.days_of_week.len());
        for raw in &self.days_of_week {
            let day: Weekday = raw.trim().parse().map_err(|_| {
                StoreError::InvalidArgument(format!("unknown weekday {raw:?}"))
            })?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
        days.sort_by_key(|d| d.num_days_from_monday());
        let column = days
            .into_iter()
            .map(weekday_name)
            .collect::<Vec<_>>()
            .join(",");

        let status = self.status.clone().unwrap_or_else(|| ACTIVE.to_string());
        Ok((parsed.format("%H:%M").to_string(), column, status))
    }
}

/// Accepted `departure_time` layouts, 24-hour first.
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Parse `07:30`, `07:30:00`, `7:30 AM` or `7:30pm`.
fn parse_departure_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

/// Canonical English name for `day`.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn split_days(column: &str) -> Vec<String> {
    column
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .collect()
}

const DETAIL_SELECT: &str = "SELECT s.id, s.bus_id, b.bus_number, s.route_id, r.route_name, \
     s.departure_time, s.days_of_week, s.status, s.created_at \
     FROM schedules s \
     JOIN buses b ON b.id = s.bus_id \
     JOIN routes r ON r.id = s.route_id";

fn detail_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleDetail> {
    let days: String = row.get(6)?;
    Ok(ScheduleDetail {
        id: row.get(0)?,
        bus_id: row.get(1)?,
        bus_number: row.get(2)?,
        route_id: row.get(3)?,
        route_name: row.get(4)?,
        departure_time: row.get(5)?,
        days_of_week: split_days(&days),
        status: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn load_detail(conn: &rusqlite::Connection, id: i64) -> StoreResult<Option<ScheduleDetail>> {
    let detail = conn
        .query_row(
            &format!("{DETAIL_SELECT} WHERE s.id = ?1"),
            rusqlite::params![id],
            detail_from_row,
        )
        .optional()?;
    Ok(detail)
}

/// CRUD operations on schedules.
#[derive(Clone)]
pub struct ScheduleStore {
    db: Database,
}

impl ScheduleStore {
    /// Create a new schedule store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a schedule. Unknown bus or route ids yield
    /// [`StoreError::InvalidArgument`].
    #[instrument(skip(self, new), fields(bus_id = new.bus_id, route_id = new.route_id))]
    pub async fn create(&self, new: NewSchedule) -> StoreResult<ScheduleDetail> {
        let (departure_time, days, status) = new.normalize()?;
        let now = Utc::now().timestamp();

        let detail = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO schedules \
                     (bus_id, route_id, departure_time, days_of_week, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        new.bus_id,
                        new.route_id,
                        departure_time,
                        days,
                        status,
                        now
                    ],
                )
                .map_err(|e| StoreError::from_write(e, "schedule"))?;
                let id = conn.last_insert_rowid();
                load_detail(conn, id)?.ok_or(StoreError::NotFound {
                    entity: "schedule",
                    id,
                })
            })
            .await?;

        debug!(schedule_id = detail.id, "schedule created");
        Ok(detail)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<ScheduleDetail>> {
        self.db.execute(move |conn| load_detail(conn, id)).await
    }

    /// List schedules in creation order.
    #[instrument(skip(self))]
    pub async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<ScheduleDetail>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{DETAIL_SELECT} ORDER BY s.id ASC LIMIT ?1 OFFSET ?2"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![limit, skip], detail_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// All schedules run by `bus_id`, earliest departure first.
    #[instrument(skip(self))]
    pub async fn list_for_bus(&self, bus_id: i64) -> StoreResult<Vec<ScheduleDetail>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{DETAIL_SELECT} WHERE s.bus_id = ?1 ORDER BY s.departure_time ASC, s.id ASC"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![bus_id], detail_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// All schedules on `route_id`, earliest departure first.
    #[instrument(skip(self))]
    pub async fn list_for_route(&self, route_id: i64) -> StoreResult<Vec<ScheduleDetail>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{DETAIL_SELECT} WHERE s.route_id = ?1 ORDER BY s.departure_time ASC, s.id ASC"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![route_id], detail_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Replace a schedule's fields. Returns `None` if no schedule has this id.
    #[instrument(skip(self, new))]
    pub async fn update(&self, id: i64, new: NewSchedule) -> StoreResult<Option<ScheduleDetail>> {
        let (departure_time, days, status) = new.normalize()?;

        self.db
            .execute(move |conn| {
                let updated = conn
                    .execute(
                        "UPDATE schedules SET bus_id = ?2, route_id = ?3, departure_time = ?4, \
                         days_of_week = ?5, status = ?6 WHERE id = ?1",
                        rusqlite::params![
                            id,
                            new.bus_id,
                            new.route_id,
                            departure_time,
                            days,
                            status
                        ],
                    )
                    .map_err(|e| StoreError::from_write(e, "schedule"))?;
                if updated == 0 {
                    return Ok(None);
                }
                load_detail(conn, id)
            })
            .await
    }

    /// Delete a schedule. Returns `false` if no such schedule exists.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.db
            .execute(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM schedules WHERE id = ?1", rusqlite::params![id])?;
                Ok(deleted > 0)
            })
            .await
    }

    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM schedules", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
