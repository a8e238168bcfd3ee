//! Driver-facing endpoints: login, dashboard and GPS updates.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use eduride_auth::{DriverLogin, Role};
use eduride_store::{ACTIVE, Driver, Location, NewLocation};

use crate::api::{ApiJson, Principal};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DriverLoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<DriverLoginRequest>,
) -> Result<Json<DriverLogin>, ApiError> {
    let login = state
        .auth
        .login_driver(&req.email, &req.password)
        .await
        .map_err(|e| ApiError::from_login(e, "Invalid email or password"))?;
    Ok(Json(login))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub time: String,
    pub stop: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DriverDashboard {
    pub driver_name: String,
    pub bus_assigned: Option<String>,
    pub route_assigned: Option<String>,
    pub schedule_today: Vec<ScheduleEntry>,
}

/// `GET /drivers/dashboard`: the driver's bus and today's departures.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<DriverDashboard>, ApiError> {
    let driver = current_driver(&state, &principal).await?;
    let Some(bus_id) = driver.bus_id else {
        return Ok(Json(DriverDashboard {
            driver_name: driver.name,
            bus_assigned: None,
            route_assigned: None,
            schedule_today: Vec::new(),
        }));
    };

    let bus_assigned = state.buses.get(bus_id).await?.map(|b| b.bus_number);
    let schedules: Vec<_> = state
        .schedules
        .list_for_bus(bus_id)
        .await?
        .into_iter()
        .filter(|s| s.is_active())
        .collect();

    let today = Local::now().weekday();
    let route_assigned = schedules
        .iter()
        .find(|s| s.runs_on(today))
        .or_else(|| schedules.first())
        .map(|s| s.route_name.clone());

    // First stop of each route, looked up once per route.
    let mut first_stops: HashMap<i64, Option<String>> = HashMap::new();
    let mut schedule_today = Vec::new();
    for schedule in schedules.iter().filter(|s| s.runs_on(today)) {
        if !first_stops.contains_key(&schedule.route_id) {
            let stop = state
                .routes
                .get(schedule.route_id)
                .await?
                .and_then(|r| r.first_stop().map(|s| s.stop_name.clone()));
            first_stops.insert(schedule.route_id, stop);
        }
        let stop = first_stops
            .get(&schedule.route_id)
            .cloned()
            .flatten()
            .unwrap_or_else(|| schedule.route_name.clone());
        schedule_today.push(ScheduleEntry {
            time: schedule.departure_time.clone(),
            stop,
        });
    }

    Ok(Json(DriverDashboard {
        driver_name: driver.name,
        bus_assigned,
        route_assigned,
        schedule_today,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationAck {
    pub status: String,
    pub message: String,
    pub location: Location,
}

/// `POST /drivers/location`: record a ping for the driver's assigned bus.
pub async fn update_location(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(update): ApiJson<LocationUpdate>,
) -> Result<Json<LocationAck>, ApiError> {
    let driver = current_driver(&state, &principal).await?;
    let bus_id = driver
        .bus_id
        .ok_or_else(|| ApiError::Conflict("No bus assigned to this driver".into()))?;

    let location = state
        .locations
        .record(NewLocation {
            bus_id,
            driver_id: driver.id,
            latitude: update.latitude,
            longitude: update.longitude,
            speed: update.speed,
        })
        .await?;
    debug!(driver_id = driver.id, bus_id, "location updated");

    Ok(Json(LocationAck {
        status: "success".into(),
        message: "Location updated successfully".into(),
        location,
    }))
}

async fn current_driver(state: &AppState, principal: &Principal) -> Result<Driver, ApiError> {
    let id = principal.require(Role::Driver)?;
    let driver = state
        .drivers
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Driver"))?;
    if driver.status != ACTIVE {
        return Err(ApiError::Unauthorized("Account is not active".into()));
    }
    Ok(driver)
}
