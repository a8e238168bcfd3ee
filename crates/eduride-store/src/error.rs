//! Error types for the eduride-store crate.
//!
//! All storage operations return [`StoreError`] via [`StoreResult`].
//! Absence of a row is never an error: lookups return `Ok(None)` and
//! deletes return `Ok(false)`.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the storage engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A schema migration failed.
    #[error("migration v{version} failed: {message}")]
    Migration { version: u32, message: String },

    /// The record targeted by an update was not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A unique column already holds the value, or the row is still
    /// referenced by another table.
    #[error("{entity} conflict: {message}")]
    Conflict {
        entity: &'static str,
        message: String,
    },

    /// An invalid argument was provided to a store operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Password hashing or salt generation failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

impl StoreError {
    /// Translate a failed INSERT/UPDATE into a typed error.
    ///
    /// UNIQUE violations become [`StoreError::Conflict`] naming the column;
    /// foreign key and CHECK violations become [`StoreError::InvalidArgument`].
    pub(crate) fn from_write(err: rusqlite::Error, entity: &'static str) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err
            && failure.code == rusqlite::ErrorCode::ConstraintViolation
        {
            let detail = message.as_deref().unwrap_or_default();
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::Conflict {
                        entity,
                        message: format!("{} already exists", constrained_column(detail)),
                    };
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::InvalidArgument(format!(
                        "{entity} references a record that does not exist"
                    ));
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => {
                    return Self::InvalidArgument(format!("{entity} check failed: {detail}"));
                }
                _ => {}
            }
        }
        Self::Sqlite(err)
    }

    /// Translate a failed DELETE into a typed error.
    ///
    /// A foreign key violation on delete means another row still points at
    /// the one being removed.
    pub(crate) fn from_delete(err: rusqlite::Error, entity: &'static str) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err
            && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        {
            return Self::Conflict {
                entity,
                message: "still referenced by other records".into(),
            };
        }
        Self::Sqlite(err)
    }
}

/// Extract the column name from a message such as
/// `UNIQUE constraint failed: students.email`.
fn constrained_column(detail: &str) -> &str {
    detail
        .rsplit(['.', ' '])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("value")
}
