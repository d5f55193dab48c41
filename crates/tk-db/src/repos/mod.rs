//! Repository modules for every stored entity.
//!
//! Each module adds methods to `TraceDb` via `impl TraceDb` blocks.

pub mod feedback_scores;
pub mod projects;
pub mod spans;
pub mod traces;
