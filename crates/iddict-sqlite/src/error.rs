//! Error types for the SQLite storage backend.

use iddict_core::StoreError;
use sqlx_core::error::Error as SqlxError;

/// Returns `true` if `err` is a uniqueness constraint violation.
pub fn is_unique_violation(err: &SqlxError) -> bool {
    matches!(err, SqlxError::Database(db_err) if db_err.is_unique_violation())
}

/// Errors specific to the SQLite storage backend.
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// The database rejected or failed a statement.
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    /// A stored document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A uniqueness constraint was violated.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Invalid backend configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SqliteError {
    /// Creates a new conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<SqliteError> for StoreError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Database(e) if is_unique_violation(&e) => {
                StoreError::conflict(e.to_string())
            }
            SqliteError::Database(e) => StoreError::backend(e.to_string()),
            SqliteError::Serialization(e) => StoreError::Serialization(e),
            SqliteError::Conflict { message } => StoreError::conflict(message),
            SqliteError::Config { message } => StoreError::invalid_operation(message),
        }
    }
}

/// Result type alias for SQLite operations.
pub type Result<T> = std::result::Result<T, SqliteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SqliteError::config("invalid URL");
        assert!(err.to_string().contains("Configuration error"));

        let err = SqliteError::conflict("duplicate client_id");
        assert!(err.to_string().contains("duplicate client_id"));
    }

    #[test]
    fn test_conversion_to_store_error() {
        let store_err: StoreError = SqliteError::conflict("duplicate").into();
        assert!(store_err.is_conflict());

        let store_err: StoreError = SqliteError::config("no database").into();
        assert!(store_err.is_invalid_operation());

        let store_err: StoreError = SqliteError::Database(SqlxError::PoolTimedOut).into();
        assert!(matches!(store_err, StoreError::Backend { .. }));
    }
}
