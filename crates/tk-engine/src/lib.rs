//! # tk-engine
//!
//! Reconciles concurrent, out-of-order trace creates and patches into one
//! record per id without store transactions.
//!
//! - [`lock::execute_with_lock`] serializes every mutation of an id under a
//!   lease lock and fails loudly if the critical section outlives the lease.
//! - [`projects::ProjectResolver`] binds requests to projects with
//!   create-then-reread on name races.
//! - [`resolver`] holds the pure create/update decisions, including placeholder
//!   completion and cross-project rejection.
//! - [`TraceService`] wires these to a `TraceStore`, `ProjectStore`, and
//!   `LockService` supplied by the caller.

pub mod error;
pub mod lock;
pub mod projects;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::TraceError;
pub use service::{EngineOptions, TraceService};
