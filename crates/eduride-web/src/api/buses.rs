//! `/buses`

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use eduride_store::{Bus, BusUpdate, NewBus};

use crate::api::{ApiJson, Pagination};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Bus>>, ApiError> {
    let (skip, limit) = page.bounds();
    Ok(Json(state.buses.list(skip, limit).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Bus>, ApiError> {
    state
        .buses
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Bus"))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewBus>,
) -> Result<(StatusCode, Json<Bus>), ApiError> {
    let bus = state.buses.create(new).await?;
    Ok((StatusCode::CREATED, Json(bus)))
}

/// Partial update of `capacity`, `model` and `status`.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<BusUpdate>,
) -> Result<Json<Bus>, ApiError> {
    state
        .buses
        .update(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Bus"))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.buses.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Bus"))
    }
}
