//! Student accounts.
//!
//! Students log in by email and may be assigned to one route. Both `email`
//! and `roll_number` are unique; a clash surfaces as
//! [`StoreError::Conflict`] naming the column.

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ACTIVE;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::password::hash_password_async;

/// A student account, without its password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub phone: String,
    /// Route the student rides, if assigned.
    pub route_id: Option<i64>,
    pub status: String,
    pub created_at: i64,
}

/// Fields accepted when creating a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub route_id: Option<i64>,
}

impl NewStudent {
    fn validate(&self) -> StoreResult<()> {
        validate_identity(&self.email, &self.roll_number)
    }
}

/// Fields accepted when editing a student.
///
/// A missing `password` or `phone` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentUpdate {
    pub name: String,
    pub email: String,
    pub roll_number: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub route_id: Option<i64>,
}

fn validate_identity(email: &str, roll_number: &str) -> StoreResult<()> {
    if email.trim().is_empty() {
        return Err(StoreError::InvalidArgument("email must not be empty".into()));
    }
    if roll_number.trim().is_empty() {
        return Err(StoreError::InvalidArgument(
            "roll_number must not be empty".into(),
        ));
    }
    Ok(())
}

const STUDENT_COLUMNS: &str =
    "id, name, email, roll_number, phone, route_id, status, created_at";

fn student_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        roll_number: row.get(3)?,
        phone: row.get(4)?,
        route_id: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// CRUD operations on student accounts.
#[derive(Clone)]
pub struct StudentStore {
    db: Database,
}

impl StudentStore {
    /// Create a new student store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a student with `status = "active"`.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create(&self, new: NewStudent) -> StoreResult<Student> {
        new.validate()?;
        let password_hash = hash_password_async(new.password.clone()).await?;
        let now = Utc::now().timestamp();

        let student = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO students \
                     (name, email, roll_number, phone, password_hash, route_id, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        new.name,
                        new.email,
                        new.roll_number,
                        new.phone,
                        password_hash,
                        new.route_id,
                        ACTIVE,
                        now
                    ],
                )
                .map_err(|e| StoreError::from_write(e, "student"))?;
                Ok(Student {
                    id: conn.last_insert_rowid(),
                    name: new.name,
                    email: new.email,
                    roll_number: new.roll_number,
                    phone: new.phone,
                    route_id: new.route_id,
                    status: ACTIVE.to_string(),
                    created_at: now,
                })
            })
            .await?;

        debug!(student_id = student.id, "student created");
        Ok(student)
    }

    /// Fetch a student by id, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> StoreResult<Option<Student>> {
        self.db
            .execute(move |conn| {
                let student = conn
                    .query_row(
                        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
                        rusqlite::params![id],
                        student_from_row,
                    )
                    .optional()?;
                Ok(student)
            })
            .await
    }

    /// Fetch a student by email, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> StoreResult<Option<Student>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                let student = conn
                    .query_row(
                        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE email = ?1"),
                        rusqlite::params![email],
                        student_from_row,
                    )
                    .optional()?;
                Ok(student)
            })
            .await
    }

    /// Fetch a student together with the stored password hash.
    #[instrument(skip(self))]
    pub async fn credentials(&self, email: &str) -> StoreResult<Option<(Student, String)>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                let found = conn
                    .query_row(
                        &format!(
                            "SELECT {STUDENT_COLUMNS}, password_hash FROM students WHERE email = ?1"
                        ),
                        rusqlite::params![email],
                        |row| Ok((student_from_row(row)?, row.get::<_, String>(8)?)),
                    )
                    .optional()?;
                Ok(found)
            })
            .await
    }

    /// List students in creation order.
    #[instrument(skip(self))]
    pub async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<Student>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {STUDENT_COLUMNS} FROM students ORDER BY id ASC LIMIT ?1 OFFSET ?2"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![limit, skip], student_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Edit a student. A new password is re-hashed; without one the
    /// stored hash is kept.
    ///
    /// Returns `None` if no student has this id. `status` and
    /// `created_at` are left untouched.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: StudentUpdate) -> StoreResult<Option<Student>> {
        validate_identity(&update.email, &update.roll_number)?;
        let password_hash = match update.password.filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password_async(password).await?),
            None => None,
        };

        self.db
            .execute(move |conn| {
                let updated = conn
                    .execute(
                        "UPDATE students SET name = ?2, email = ?3, roll_number = ?4, \
                         phone = COALESCE(?5, phone), \
                         password_hash = COALESCE(?6, password_hash), route_id = ?7 \
                         WHERE id = ?1",
                        rusqlite::params![
                            id,
                            update.name,
                            update.email,
                            update.roll_number,
                            update.phone,
                            password_hash,
                            update.route_id
                        ],
                    )
                    .map_err(|e| StoreError::from_write(e, "student"))?;
                if updated == 0 {
                    return Ok(None);
                }
                let student = conn.query_row(
                    &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
                    rusqlite::params![id],
                    student_from_row,
                )?;
                Ok(Some(student))
            })
            .await
    }

    /// Delete a student. Returns `false` if no such student exists.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.db
            .execute(move |conn| {
                let deleted = conn
                    .execute("DELETE FROM students WHERE id = ?1", rusqlite::params![id])
                    .map_err(|e| StoreError::from_delete(e, "student"))?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Return the total number of students.
    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }

    /// Count students registered with exactly this email.
    pub async fn count_by_email(&self, email: &str) -> StoreResult<i64> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM students WHERE email = ?1",
                    rusqlite::params![email],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
