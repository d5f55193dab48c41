//! Engine error taxonomy.

use thiserror::Error;
use tk_core::errors::{CoreError, LockError, StoreError};
use uuid::Uuid;

/// Failures returned by [`crate::TraceService`].
///
/// Conflicts and duplicates are always one of the typed variants below;
/// a `StoreError::BindingMismatch` never escapes as `Store`.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Malformed or wrong-version id, rejected before any I/O.
    #[error(transparent)]
    InvalidIdentifier(CoreError),

    /// Request payload rejected before any I/O (e.g. blank trace name).
    #[error(transparent)]
    InvalidRequest(CoreError),

    /// Create for an id that already holds a realized trace in the same project.
    #[error("trace {id} already exists")]
    DuplicateEntity { id: Uuid },

    /// The id is already bound to a different project or workspace.
    #[error("trace {id} is already bound to another project or workspace")]
    IdentifierConflict { id: Uuid },

    #[error("trace {id} not found")]
    NotFound { id: Uuid },

    #[error("project {id} not found")]
    ProjectNotFound { id: Uuid },

    /// A concurrent project create won the race but its row could not be
    /// read back yet. Safe to retry.
    #[error("project '{name}' could not be resolved, retry")]
    ProjectUnavailable { name: String },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Store(StoreError),
}

impl TraceError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProjectUnavailable { .. }
                | Self::Lock(LockError::WaitTimeout { .. } | LockError::LeaseExpired { .. })
        )
    }
}

impl From<StoreError> for TraceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BindingMismatch { id } => Self::IdentifierConflict { id },
            other => Self::Store(other),
        }
    }
}

impl From<CoreError> for TraceError {
    fn from(err: CoreError) -> Self {
        Self::InvalidIdentifier(err)
    }
}
