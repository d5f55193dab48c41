//! # tk-db
//!
//! libSQL storage for tracekit.
//!
//! Holds trace rows, their dependent spans and feedback scores, the project
//! registry, and the lease-lock table. `TraceDb` implements the `TraceStore`
//! and `ProjectStore` contracts from `tk-core`; [`locks::LeaseLockService`]
//! implements `LockService` on the same database so every process pointed at
//! it shares one set of locks.
//!
//! No write here opens a transaction. Each mutation is one statement whose
//! conflict behaviour (upsert guard, `RETURNING` row) tells the caller what
//! happened.

pub mod error;
pub mod helpers;
pub mod locks;
mod migrations;
pub mod repos;
mod store;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::Path;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for all tracekit state.
pub struct TraceDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl TraceDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Creates the parent directory if needed and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Migration(format!(
                            "create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let trace_db = Self { db, conn };
        trace_db.run_migrations().await?;
        tracing::debug!(path, "opened trace database");
        Ok(trace_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
