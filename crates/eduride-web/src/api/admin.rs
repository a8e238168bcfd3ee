//! Admin login, dashboard, and student/driver account management.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use eduride_auth::AdminLogin;
use eduride_store::{ACTIVE, Driver, DriverUpdate, NewDriver, NewStudent, Student, StudentUpdate};

use crate::api::{ApiJson, Pagination};
use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /admin/login
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AdminLoginRequest>,
) -> Result<Json<AdminLogin>, ApiError> {
    let login = state
        .auth
        .login_admin(&req.username, &req.password)
        .await
        .map_err(|e| ApiError::from_login(e, "Invalid username or password"))?;
    Ok(Json(login))
}

// ---------------------------------------------------------------------------
// GET /admin/dashboard
// ---------------------------------------------------------------------------

/// Live row counts.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_buses: i64,
    pub total_routes: i64,
    pub total_students: i64,
    pub total_drivers: i64,
    pub active_buses: i64,
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(DashboardStats {
        total_buses: state.buses.count().await?,
        total_routes: state.routes.count().await?,
        total_students: state.students.count().await?,
        total_drivers: state.drivers.count().await?,
        active_buses: state.buses.count_by_status(ACTIVE).await?,
    }))
}

// ---------------------------------------------------------------------------
// /admin/students
// ---------------------------------------------------------------------------

pub async fn create_student(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewStudent>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let student = state.students.create(new).await?;
    info!(student_id = student.id, "student account created");
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let (skip, limit) = page.bounds();
    Ok(Json(state.students.list(skip, limit).await?))
}

pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, ApiError> {
    state
        .students
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Student"))
}

/// Omitting `password` keeps the current one.
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<StudentUpdate>,
) -> Result<Json<Student>, ApiError> {
    state
        .students
        .update(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Student"))
}

pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.students.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Student"))
    }
}

// ---------------------------------------------------------------------------
// /admin/drivers
// ---------------------------------------------------------------------------

pub async fn create_driver(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewDriver>,
) -> Result<(StatusCode, Json<Driver>), ApiError> {
    let driver = state.drivers.create(new).await?;
    info!(driver_id = driver.id, "driver account created");
    Ok((StatusCode::CREATED, Json(driver)))
}

pub async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Driver>>, ApiError> {
    let (skip, limit) = page.bounds();
    Ok(Json(state.drivers.list(skip, limit).await?))
}

pub async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Driver>, ApiError> {
    state
        .drivers
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Driver"))
}

pub async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<DriverUpdate>,
) -> Result<Json<Driver>, ApiError> {
    state
        .drivers
        .update(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Driver"))
}

pub async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.drivers.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Driver"))
    }
}
