//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Input rejected before touching the store
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl DatabaseError {
    /// Map a write that references a missing parent row to `NotFound`.
    pub(crate) fn missing_parent(err: sqlx::Error, entity: &'static str, id: i64) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_foreign_key_violation() {
                return DatabaseError::NotFound {
                    entity,
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
