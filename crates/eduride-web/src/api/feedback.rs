//! `/feedback`

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use eduride_store::{Feedback, NewFeedback, UserType};

use crate::api::{ApiJson, Pagination, iso_timestamp};
use crate::error::ApiError;
use crate::state::AppState;

/// Entries included in `recent_feedback`.
const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub id: i64,
    pub user_id: i64,
    pub user_type: UserType,
    pub rating: i64,
    pub category: String,
    pub message: String,
    pub created_at: String,
    pub status: String,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            user_id: f.user_id,
            user_type: f.user_type,
            rating: f.rating,
            category: f.category,
            message: f.message,
            created_at: iso_timestamp(f.created_at),
            status: f.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub total_feedback: i64,
    pub average_rating: f64,
    pub feedback_by_category: BTreeMap<String, i64>,
    pub recent_feedback: Vec<FeedbackResponse>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<FeedbackResponse>>, ApiError> {
    let (skip, limit) = page.bounds();
    let rows = state.feedback.list(skip, limit).await?;
    Ok(Json(rows.into_iter().map(FeedbackResponse::from).collect()))
}

pub async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.feedback.summary(RECENT_LIMIT).await?;
    Ok(Json(SummaryResponse {
        total_feedback: summary.total_feedback,
        average_rating: summary.average_rating,
        feedback_by_category: summary.feedback_by_category,
        recent_feedback: summary
            .recent_feedback
            .into_iter()
            .map(FeedbackResponse::from)
            .collect(),
    }))
}

/// Ratings outside 1..=5 are rejected with 422.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewFeedback>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ApiError> {
    let feedback = state.feedback.create(new).await?;
    Ok((StatusCode::CREATED, Json(feedback.into())))
}
