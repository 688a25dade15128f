//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

impl DbError {
    /// Map a UNIQUE constraint failure on insert to `Duplicate`
    pub(crate) fn on_insert(e: sqlx::Error, duplicate: impl FnOnce() -> String) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::Duplicate(duplicate())
            }
            _ => DbError::Connection(e),
        }
    }
}
