//! Collaborator contracts consumed by the reconciliation engine.
//!
//! The engine is constructed from one implementation of each trait. None of
//! them promise multi-statement transactions: conflicts are reported per write
//! through typed [`StoreError`] variants, and per-id exclusivity comes from
//! [`LockService`].

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Project, Trace, TracePage, TraceSearchCriteria, TraceUpdate, TraceWorkspace};
use crate::enums::EntityType;
use crate::errors::{LockError, StoreError};
use crate::identity::RequestContext;

// ---------------------------------------------------------------------------
// TraceStore
// ---------------------------------------------------------------------------

/// Persistence for trace rows and the rows that depend on them.
#[async_trait]
pub trait TraceStore: Send + Sync {
    /// Point lookup scoped to `workspace_id`.
    async fn find_by_id(&self, workspace_id: &str, id: Uuid) -> Result<Option<Trace>, StoreError>;

    /// Write a full trace row for the caller's workspace.
    ///
    /// Overwrites an existing row only when it carries the same project and
    /// workspace binding; otherwise fails with [`StoreError::BindingMismatch`].
    async fn insert(&self, ctx: &RequestContext, trace: &Trace) -> Result<(), StoreError>;

    /// Write a placeholder row (blank name, epoch start) carrying the patch fields.
    ///
    /// Same binding rule as [`TraceStore::insert`].
    async fn partial_insert(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        id: Uuid,
        update: &TraceUpdate,
    ) -> Result<(), StoreError>;

    /// Apply the `Some` fields of `update` to the row bound to `project_id`.
    ///
    /// Fails with [`StoreError::BindingMismatch`] if no such row was touched.
    async fn update(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        id: Uuid,
        update: &TraceUpdate,
    ) -> Result<(), StoreError>;

    /// Remove feedback scores attached to an entity. Returns rows removed.
    async fn delete_feedback_scores(
        &self,
        workspace_id: &str,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<u64, StoreError>;

    /// Remove spans belonging to a trace. Returns rows removed.
    async fn delete_spans(&self, workspace_id: &str, trace_id: Uuid) -> Result<u64, StoreError>;

    /// Remove the trace row itself.
    async fn delete(&self, workspace_id: &str, id: Uuid) -> Result<(), StoreError>;

    /// One page of traces in `project_id`, newest first.
    async fn find(
        &self,
        workspace_id: &str,
        project_id: Uuid,
        page: u32,
        size: u32,
        criteria: &TraceSearchCriteria,
    ) -> Result<TracePage, StoreError>;

    /// Owning workspace of each id that exists. Not workspace scoped.
    async fn get_workspace_ownership(&self, ids: &[Uuid]) -> Result<Vec<TraceWorkspace>, StoreError>;
}

// ---------------------------------------------------------------------------
// ProjectStore
// ---------------------------------------------------------------------------

/// Persistence for projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get(&self, id: Uuid, workspace_id: &str) -> Result<Option<Project>, StoreError>;

    /// Insert a new project.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when `(workspace_id, name)` is taken.
    async fn create(&self, project: &Project) -> Result<(), StoreError>;

    async fn find_by_names(
        &self,
        workspace_id: &str,
        names: &[String],
    ) -> Result<Vec<Project>, StoreError>;
}

// ---------------------------------------------------------------------------
// LockService
// ---------------------------------------------------------------------------

/// Identity of a lockable entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    pub entity_id: Uuid,
    pub entity_kind: &'static str,
}

impl LockKey {
    #[must_use]
    pub const fn new(entity_id: Uuid, entity_kind: &'static str) -> Self {
        Self {
            entity_id,
            entity_kind,
        }
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.entity_kind, self.entity_id)
    }
}

/// Proof of holding a lock, valid for `lease` from `acquired_at`.
#[derive(Debug, Clone)]
pub struct LockLease {
    pub key: LockKey,
    /// Opaque token identifying this holder to the lock backend.
    pub holder: String,
    pub lease: Duration,
    pub acquired_at: Instant,
}

impl LockLease {
    /// Time left before the backend may hand the lock to someone else.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.lease.saturating_sub(self.acquired_at.elapsed())
    }
}

/// Fleet-wide mutual exclusion with a bounded lease.
///
/// At most one live lease exists per key at a time.
#[async_trait]
pub trait LockService: Send + Sync {
    async fn acquire(&self, key: &LockKey) -> Result<LockLease, LockError>;

    /// Give the lock back.
    ///
    /// Fails with [`LockError::LeaseLost`] if the lease had already expired and
    /// been taken over.
    async fn release(&self, lease: LockLease) -> Result<(), LockError>;
}
