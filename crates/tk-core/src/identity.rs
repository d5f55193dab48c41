use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Caller identity for a single operation.
///
/// Produced by whatever authenticates the caller (outside tracekit) and passed
/// explicitly into every engine call. The workspace is never taken from a
/// request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestContext {
    /// Tenant id all reads and writes are scoped to.
    pub workspace_id: String,
    /// Human-readable workspace name.
    pub workspace_name: String,
    /// Recorded as `created_by` / `last_updated_by`.
    pub user_name: String,
}

impl RequestContext {
    #[must_use]
    pub fn new(
        workspace_id: impl Into<String>,
        workspace_name: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            workspace_name: workspace_name.into(),
            user_name: user_name.into(),
        }
    }
}
