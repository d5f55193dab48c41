//! Database error types for tk-db.

use thiserror::Error;
use tk_core::errors::StoreError;
use uuid::Uuid;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned an unparseable value.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A unique key rejected the insert.
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: String, key: String },

    /// An upsert or update matched the id but not its project/workspace binding.
    #[error("trace {id} is bound to a different project or workspace")]
    BindingMismatch { id: Uuid },

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::AlreadyExists { entity, key } => Self::AlreadyExists { entity, key },
            DatabaseError::BindingMismatch { id } => Self::BindingMismatch { id },
            DatabaseError::InvalidState(msg) => Self::Corrupt(msg),
            DatabaseError::Other(e) => Self::Other(e),
            other @ (DatabaseError::Query(_)
            | DatabaseError::Migration(_)
            | DatabaseError::NoResult
            | DatabaseError::LibSql(_)) => Self::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_mismatch_stays_typed() {
        let id = Uuid::now_v7();
        let store: StoreError = DatabaseError::BindingMismatch { id }.into();
        assert!(matches!(store, StoreError::BindingMismatch { id: got } if got == id));
    }

    #[test]
    fn driver_failures_become_backend() {
        let store: StoreError = DatabaseError::Query("boom".into()).into();
        match store {
            StoreError::Backend(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected: {other}"),
        }
    }
}
