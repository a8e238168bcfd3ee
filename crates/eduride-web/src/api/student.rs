//! Student-facing endpoints: login, dashboard and live bus tracking.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use eduride_auth::{Role, StudentLogin};
use eduride_store::{ACTIVE, Location, RouteStop, Student};

use crate::api::{ApiJson, Principal, iso_timestamp};
use crate::error::ApiError;
use crate::state::AppState;

/// A ping older than this marks the bus `offline`.
const ONLINE_WINDOW_SECS: i64 = 5 * 60;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Deserialize)]
pub struct StudentLoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<StudentLoginRequest>,
) -> Result<Json<StudentLogin>, ApiError> {
    let login = state
        .auth
        .login_student(&req.email, &req.password)
        .await
        .map_err(|e| ApiError::from_login(e, "Invalid email or password"))?;
    Ok(Json(login))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentDashboard {
    pub student_name: String,
    pub roll_number: String,
    pub route_assigned: Option<String>,
    pub bus_number: Option<String>,
}

/// `GET /students/dashboard`, for the student named by the bearer token.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<StudentDashboard>, ApiError> {
    let student = current_student(&state, &principal).await?;

    let (route_assigned, bus_number) = match student.route_id {
        Some(route_id) => {
            let route_name = state
                .routes
                .get(route_id)
                .await?
                .map(|r| r.route.route_name);
            let bus_number = state
                .schedules
                .list_for_route(route_id)
                .await?
                .into_iter()
                .find(|s| s.is_active())
                .map(|s| s.bus_number);
            (route_name, bus_number)
        }
        None => (None, None),
    };

    Ok(Json(StudentDashboard {
        student_name: student.name,
        roll_number: student.roll_number,
        route_assigned,
        bus_number,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BusTrackingInfo {
    pub bus_number: String,
    pub route_name: String,
    pub current_location: Coordinates,
    pub estimated_arrival: String,
    pub status: String,
    pub last_updated: String,
}

/// `GET /students/track-bus`: the freshest ping from any bus with an
/// active schedule on the student's route.
pub async fn track_bus(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<BusTrackingInfo>, ApiError> {
    let student = current_student(&state, &principal).await?;
    let route_id = student
        .route_id
        .ok_or_else(|| ApiError::NotFound("No route assigned".into()))?;
    let route = state
        .routes
        .get(route_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Route"))?;

    let mut latest: Option<(String, Location)> = None;
    for schedule in state.schedules.list_for_route(route_id).await? {
        if !schedule.is_active() {
            continue;
        }
        if let Some(ping) = state.locations.latest_for_bus(schedule.bus_id).await?
            && latest
                .as_ref()
                .is_none_or(|(_, best)| ping.timestamp > best.timestamp)
        {
            latest = Some((schedule.bus_number, ping));
        }
    }
    let (bus_number, ping) =
        latest.ok_or_else(|| ApiError::NotFound("No live location for this route".into()))?;

    let age = Utc::now().timestamp() - ping.timestamp;
    let status = if age < ONLINE_WINDOW_SECS {
        "on_route"
    } else {
        "offline"
    };

    Ok(Json(BusTrackingInfo {
        bus_number,
        estimated_arrival: estimate_arrival(&ping, route.last_stop()),
        route_name: route.route.route_name,
        current_location: Coordinates {
            lat: ping.latitude,
            lng: ping.longitude,
        },
        status: status.to_string(),
        last_updated: iso_timestamp(ping.timestamp),
    }))
}

async fn current_student(state: &AppState, principal: &Principal) -> Result<Student, ApiError> {
    let id = principal.require(Role::Student)?;
    let student = state
        .students
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Student"))?;
    if student.status != ACTIVE {
        return Err(ApiError::Unauthorized("Account is not active".into()));
    }
    Ok(student)
}

/// Straight-line time to the final stop at the last reported speed.
fn estimate_arrival(ping: &Location, destination: Option<&RouteStop>) -> String {
    let (Some(stop), Some(speed)) = (destination, ping.speed.filter(|s| *s > 0.0)) else {
        return "unknown".into();
    };
    let km = haversine_km(ping.latitude, ping.longitude, stop.latitude, stop.longitude);
    let minutes = (km / speed * 60.0).ceil() as i64;
    match minutes {
        0 => "arriving".into(),
        1 => "1 minute".into(),
        n => format!("{n} minutes"),
    }
}

fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(speed: Option<f64>) -> Location {
        Location {
            id: 1,
            bus_id: 1,
            driver_id: 1,
            latitude: 9.8825,
            longitude: 78.0815,
            speed,
            timestamp: 0,
        }
    }

    fn stop(latitude: f64, longitude: f64) -> RouteStop {
        RouteStop {
            id: 1,
            stop_name: "Periyar".into(),
            latitude,
            longitude,
            order: 1,
        }
    }

    #[test]
    fn haversine_matches_known_distance() {
        // One degree of latitude is about 111.2 km.
        let km = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((km - 111.19).abs() < 0.1, "got {km}");
        assert_eq!(haversine_km(9.9, 78.1, 9.9, 78.1), 0.0);
    }

    #[test]
    fn arrival_estimate_uses_speed() {
        // ~11.1 km at 60 km/h is just over 11 minutes.
        let eta = estimate_arrival(&ping(Some(60.0)), Some(&stop(9.9825, 78.0815)));
        assert_eq!(eta, "12 minutes");
        assert_eq!(
            estimate_arrival(&ping(Some(60.0)), Some(&stop(9.8825, 78.0815))),
            "arriving"
        );
    }

    #[test]
    fn arrival_unknown_without_speed_or_stops() {
        assert_eq!(estimate_arrival(&ping(None), Some(&stop(10.0, 78.0))), "unknown");
        assert_eq!(estimate_arrival(&ping(Some(0.0)), Some(&stop(10.0, 78.0))), "unknown");
        assert_eq!(estimate_arrival(&ping(Some(40.0)), None), "unknown");
    }
}
