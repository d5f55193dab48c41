//! Cross-cutting error types for tracekit.
//!
//! This module defines errors that can originate from any crate in the system.
//! `StoreError` and `LockError` are the failure vocabulary of the collaborator
//! contracts in [`crate::store`]; backend crates convert their own errors into
//! them. The engine's `TraceError` is defined in `tk-engine` where all of these
//! converge.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can be raised by any tracekit crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// An identifier is malformed or carries the wrong UUID version.
    #[error("Invalid {entity_type} identifier '{id}': {reason}")]
    InvalidIdentifier {
        entity_type: String,
        id: String,
        reason: String,
    },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures reported by a store backend.
///
/// Conflicts are typed so callers never have to inspect driver messages.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (e.g. project name taken).
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: String, key: String },

    /// The row for `id` exists under a different project/workspace binding,
    /// so the write was refused.
    #[error("trace {id} is bound to a different project or workspace")]
    BindingMismatch { id: Uuid },

    /// A stored value could not be decoded into its entity type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Any other backend failure.
    #[error("store backend failure: {0}")]
    Backend(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures reported by a lock service or by the scoped lock runner.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock could not be acquired before the wait timeout elapsed.
    #[error("timed out after {waited_ms}ms waiting for lock {key}")]
    WaitTimeout { key: String, waited_ms: u64 },

    /// The critical section ran longer than the lease it was granted.
    #[error("critical section for {key} exceeded its {lease_ms}ms lease")]
    LeaseExpired { key: String, lease_ms: u64 },

    /// On release the lease was no longer held by this holder.
    #[error("lease for {key} was lost before release")]
    LeaseLost { key: String },

    /// Any other lock backend failure.
    #[error("lock backend failure: {0}")]
    Backend(String),
}
