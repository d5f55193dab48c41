use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Project name used when a request names none.
pub const DEFAULT_PROJECT_NAME: &str = "Default Project";

/// A named grouping of traces. `(workspace_id, name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Project {
    pub id: Uuid,
    pub workspace_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub last_updated_at: DateTime<Utc>,
    pub last_updated_by: String,
}

/// Resolve a requested project name, falling back to `default` when blank.
#[must_use]
pub fn project_name_or_default<'a>(requested: Option<&'a str>, default: &'a str) -> &'a str {
    match requested.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => default,
    }
}
