//! `/routes`. Every response carries the stops sorted by `order`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use eduride_store::{NewRoute, RouteWithStops};

use crate::api::{ApiJson, Pagination};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<RouteWithStops>>, ApiError> {
    let (skip, limit) = page.bounds();
    Ok(Json(state.routes.list(skip, limit).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<RouteWithStops>, ApiError> {
    state
        .routes
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Route"))
}

/// Create a route and its stops in one transaction.
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewRoute>,
) -> Result<(StatusCode, Json<RouteWithStops>), ApiError> {
    let route = state.routes.create(new).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

/// Replace the route and its full stop list.
pub async fn replace(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(new): ApiJson<NewRoute>,
) -> Result<Json<RouteWithStops>, ApiError> {
    state
        .routes
        .replace(id, new)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Route"))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.routes.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Route"))
    }
}
