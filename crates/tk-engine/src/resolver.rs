//! Write decisions for a trace id given what is already stored.
//!
//! Pure functions: the caller reads the existing row under the lock, asks for
//! a decision, and performs exactly one store write (or none).

use tk_core::entities::Trace;
use uuid::Uuid;

/// What a create should do with the stored row for its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDecision {
    /// Nothing stored yet: insert the full trace.
    Insert,
    /// A placeholder in the same project: overwrite it with the full trace.
    CompletePlaceholder,
    /// A realized trace in the same project already holds the id.
    RejectDuplicate,
    /// The id is bound to a different project.
    RejectConflict,
}

/// What an update should do with the stored row for its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Same project: apply the patch to the stored row.
    Apply,
    /// Nothing stored yet: write a placeholder carrying the patch.
    InsertPlaceholder,
    /// The id is bound to a different project.
    RejectConflict,
}

impl CreateDecision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::CompletePlaceholder => "complete_placeholder",
            Self::RejectDuplicate => "reject_duplicate",
            Self::RejectConflict => "reject_conflict",
        }
    }
}

impl UpdateDecision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::InsertPlaceholder => "insert_placeholder",
            Self::RejectConflict => "reject_conflict",
        }
    }
}

/// Decide a create for `project_id` against the stored row, if any.
///
/// A placeholder is only completed by a create in its own project; a
/// different project is a conflict whether or not the row is realized.
#[must_use]
pub fn resolve_create(existing: Option<&Trace>, project_id: Uuid) -> CreateDecision {
    match existing {
        None => CreateDecision::Insert,
        Some(row) if row.is_placeholder() && row.project_id == project_id => {
            CreateDecision::CompletePlaceholder
        }
        Some(row) if row.project_id != project_id => CreateDecision::RejectConflict,
        Some(_) => CreateDecision::RejectDuplicate,
    }
}

/// Decide an update for `project_id` against the stored row, if any.
#[must_use]
pub fn resolve_update(existing: Option<&Trace>, project_id: Uuid) -> UpdateDecision {
    match existing {
        None => UpdateDecision::InsertPlaceholder,
        Some(row) if row.project_id == project_id => UpdateDecision::Apply,
        Some(_) => UpdateDecision::RejectConflict,
    }
}
