//! Entity structs for all tracekit domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `tk-db` migrations).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! roundtrip and schema validation.

mod feedback;
mod project;
mod span;
mod trace;

pub use feedback::FeedbackScore;
pub use project::{DEFAULT_PROJECT_NAME, Project, project_name_or_default};
pub use span::Span;
pub use trace::{NewTrace, Trace, TracePage, TraceSearchCriteria, TraceUpdate, TraceWorkspace};
