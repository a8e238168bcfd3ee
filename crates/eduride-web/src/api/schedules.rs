//! `/schedules`

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use eduride_store::{NewSchedule, ScheduleDetail};

use crate::api::{ApiJson, Pagination};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<ScheduleDetail>>, ApiError> {
    let (skip, limit) = page.bounds();
    Ok(Json(state.schedules.list(skip, limit).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ScheduleDetail>, ApiError> {
    state
        .schedules
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Schedule"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewSchedule>,
) -> Result<(StatusCode, Json<ScheduleDetail>), ApiError> {
    let schedule = state.schedules.create(new).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(new): ApiJson<NewSchedule>,
) -> Result<Json<ScheduleDetail>, ApiError> {
    state
        .schedules
        .update(id, new)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Schedule"))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.schedules.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Schedule"))
    }
}
