//! Liveness endpoints, mounted outside the API prefix.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub database: bool,
}

/// `GET /`
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        service: state.config.app_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /health`. Reports `degraded` when the database does not answer.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = state.db.ping().await;
    Json(HealthResponse {
        status: if database { "healthy" } else { "degraded" },
        service: state.config.app_name.clone(),
        database,
    })
}
