//! User feedback and its aggregate summary.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use rusqlite::OptionalExtension;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Status assigned to new feedback.
pub const PENDING: &str = "pending";

/// Kind of account that submitted the feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Driver,
    Admin,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Driver => "driver",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for UserType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for UserType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "student" => Ok(Self::Student),
            "driver" => Ok(Self::Driver),
            "admin" => Ok(Self::Admin),
            other => Err(FromSqlError::Other(
                format!("unknown user_type {other:?}").into(),
            )),
        }
    }
}

/// A stored piece of feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    pub user_type: UserType,
    /// 1 to 5 inclusive.
    pub rating: i64,
    pub category: String,
    pub message: String,
    pub status: String,
    pub created_at: i64,
}

/// Fields accepted when submitting feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    pub user_id: i64,
    pub user_type: UserType,
    pub rating: i64,
    pub category: String,
    pub message: String,
}

/// Aggregates over every stored feedback row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub total_feedback: i64,
    /// Mean rating rounded to two decimals, `0.0` when there is no feedback.
    pub average_rating: f64,
    pub feedback_by_category: BTreeMap<String, i64>,
    /// Most recent first.
    pub recent_feedback: Vec<Feedback>,
}

const FEEDBACK_COLUMNS: &str =
    "id, user_id, user_type, rating, category, message, status, created_at";

fn feedback_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_type: row.get(2)?,
        rating: row.get(3)?,
        category: row.get(4)?,
        message: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Feedback persistence.
#[derive(Clone)]
pub struct FeedbackStore {
    db: Database,
}

impl FeedbackStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store feedback with `status = "pending"`.
    ///
    /// A rating outside `1..=5` is rejected before anything is written.
    #[instrument(skip(self, new), fields(user_type = %new.user_type, rating = new.rating))]
    pub async fn create(&self, new: NewFeedback) -> StoreResult<Feedback> {
        if !(1..=5).contains(&new.rating) {
            return Err(StoreError::InvalidArgument(format!(
                "rating must be between 1 and 5, got {}",
                new.rating
            )));
        }
        if new.category.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "category must not be empty".into(),
            ));
        }
        let now = Utc::now().timestamp();

        let feedback = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO feedbacks \
                     (user_id, user_type, rating, category, message, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        new.user_id,
                        new.user_type,
                        new.rating,
                        new.category,
                        new.message,
                        PENDING,
                        now
                    ],
                )
                .map_err(|e| StoreError::from_write(e, "feedback"))?;
                Ok(Feedback {
                    id: conn.last_insert_rowid(),
                    user_id: new.user_id,
                    user_type: new.user_type,
                    rating: new.rating,
                    category: new.category,
                    message: new.message,
                    status: PENDING.to_string(),
                    created_at: now,
                })
            })
            .await?;

        debug!(feedback_id = feedback.id, "feedback stored");
        Ok(feedback)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<Feedback>> {
        self.db
            .execute(move |conn| {
                let feedback = conn
                    .query_row(
                        &format!("SELECT {FEEDBACK_COLUMNS} FROM feedbacks WHERE id = ?1"),
                        rusqlite::params![id],
                        feedback_from_row,
                    )
                    .optional()?;
                Ok(feedback)
            })
            .await
    }

    /// List feedback in submission order.
    #[instrument(skip(self))]
    pub async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<Feedback>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {FEEDBACK_COLUMNS} FROM feedbacks ORDER BY id ASC LIMIT ?1 OFFSET ?2"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![limit, skip], feedback_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Compute totals, the mean rating, per-category counts and the
    /// `recent_limit` newest entries in one session.
    #[instrument(skip(self))]
    pub async fn summary(&self, recent_limit: i64) -> StoreResult<FeedbackSummary> {
        self.db
            .execute(move |conn| {
                let (total, average): (i64, Option<f64>) = conn.query_row(
                    "SELECT COUNT(*), AVG(rating) FROM feedbacks",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;

                let mut stmt = conn.prepare(
                    "SELECT category, COUNT(*) FROM feedbacks GROUP BY category ORDER BY category",
                )?;
                let by_category = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                    .collect::<Result<BTreeMap<_, _>, _>>()?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {FEEDBACK_COLUMNS} FROM feedbacks ORDER BY id DESC LIMIT ?1"
                ))?;
                let recent = stmt
                    .query_map(rusqlite::params![recent_limit], feedback_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                let average = average.map(|a| (a * 100.0).round() / 100.0).unwrap_or(0.0);
                Ok(FeedbackSummary {
                    total_feedback: total,
                    average_rating: average,
                    feedback_by_category: by_category,
                    recent_feedback: recent,
                })
            })
            .await
    }

    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM feedbacks", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> FeedbackStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        FeedbackStore::new(db)
    }

    fn new_feedback(rating: i64, category: &str) -> NewFeedback {
        NewFeedback {
            user_id: 1,
            user_type: UserType::Student,
            rating,
            category: category.into(),
            message: "Bus was on time".into(),
        }
    }

    #[tokio::test]
    async fn create_defaults_to_pending() {
        let store = setup_store().await;
        let feedback = store.create(new_feedback(5, "service")).await.unwrap();
        assert_eq!(feedback.status, "pending");
        assert_eq!(feedback.user_type, UserType::Student);
        assert_eq!(store.get(feedback.id).await.unwrap().unwrap(), feedback);
    }

    #[tokio::test]
    async fn rating_out_of_range_rejected() {
        let store = setup_store().await;
        for rating in [0, 6, -1] {
            assert!(matches!(
                store.create(new_feedback(rating, "service")).await,
                Err(StoreError::InvalidArgument(_))
            ));
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_summary_has_zero_average() {
        let store = setup_store().await;
        let summary = store.summary(5).await.unwrap();
        assert_eq!(summary.total_feedback, 0);
        assert_eq!(summary.average_rating, 0.0);
        assert!(summary.feedback_by_category.is_empty());
        assert!(summary.recent_feedback.is_empty());
    }

    #[tokio::test]
    async fn summary_aggregates_live_rows() {
        let store = setup_store().await;
        store.create(new_feedback(5, "service")).await.unwrap();
        store.create(new_feedback(4, "service")).await.unwrap();
        store.create(new_feedback(2, "bus_condition")).await.unwrap();

        let summary = store.summary(2).await.unwrap();
        assert_eq!(summary.total_feedback, 3);
        assert_eq!(summary.average_rating, 3.67);
        assert_eq!(summary.feedback_by_category["service"], 2);
        assert_eq!(summary.feedback_by_category["bus_condition"], 1);

        assert_eq!(summary.recent_feedback.len(), 2);
        assert_eq!(summary.recent_feedback[0].category, "bus_condition");
    }

    #[test]
    fn user_type_serializes_lowercase() {
        assert_eq!(UserType::Driver.to_string(), "driver");
        assert_eq!(UserType::Admin.as_str(), "admin");
    }
}
