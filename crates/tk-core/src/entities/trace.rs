use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

/// One observed execution, bound to exactly one project in one workspace.
///
/// A row whose `name` is empty and whose `start_time` is the Unix epoch is a
/// placeholder: a patch arrived before any create for this id. Creates never
/// carry a blank name, so no realized row can take that shape.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Trace {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub created_by: String,
    pub last_updated_by: String,
}

impl Trace {
    /// Start time carried by placeholder rows.
    pub const PLACEHOLDER_START_TIME: DateTime<Utc> = DateTime::UNIX_EPOCH;

    /// Whether this row was synthesized from a patch and never realized by a create.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty() && self.start_time == Self::PLACEHOLDER_START_TIME
    }
}

/// A trace creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewTrace {
    /// Client-supplied id. Generated when absent.
    pub id: Option<Uuid>,
    /// Blank or missing resolves to the default project.
    pub project_name: Option<String>,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl NewTrace {
    #[must_use]
    pub fn new(name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            start_time,
            ..Self::default()
        }
    }

    /// Reject requests that could be mistaken for a placeholder row.
    ///
    /// # Errors
    ///
    /// `CoreError::Validation` when `name` is blank after trimming.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("trace name must not be blank".to_string()));
        }
        Ok(())
    }

    /// Materialize the stored row for this request.
    #[must_use]
    pub fn bind(&self, id: Uuid, project_id: Uuid, user: &str, now: DateTime<Utc>) -> Trace {
        Trace {
            id,
            project_id,
            name: self.name.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            input: self.input.clone(),
            output: self.output.clone(),
            metadata: self.metadata.clone(),
            tags: self.tags.clone(),
            created_at: now,
            last_updated_at: now,
            created_by: user.to_string(),
            last_updated_by: user.to_string(),
        }
    }
}

/// A partial update. Only `Some` fields are applied.
///
/// Patches never carry `name` or `start_time`; those are set by the create path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TraceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// When set, the project is resolved by id instead of by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

impl TraceUpdate {
    /// True when the patch would not change any payload field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end_time.is_none()
            && self.input.is_none()
            && self.output.is_none()
            && self.metadata.is_none()
            && self.tags.is_none()
    }
}

/// Filter for paged trace queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TraceSearchCriteria {
    pub project_name: Option<String>,
    pub project_id: Option<Uuid>,
    /// Hide rows still in placeholder state.
    #[serde(default)]
    pub exclude_placeholders: bool,
}

impl TraceSearchCriteria {
    #[must_use]
    pub fn by_project_name(name: impl Into<String>) -> Self {
        Self {
            project_name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_project_id(project_id: Uuid) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn realized_only(mut self) -> Self {
        self.exclude_placeholders = true;
        self
    }
}

/// One page of traces. Pages are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TracePage {
    pub page: u32,
    pub size: u32,
    pub total: u64,
    pub content: Vec<Trace>,
}

impl TracePage {
    #[must_use]
    pub const fn empty(page: u32) -> Self {
        Self {
            page,
            size: 0,
            total: 0,
            content: Vec::new(),
        }
    }
}

/// The workspace that owns a trace id.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TraceWorkspace {
    pub id: Uuid,
    pub workspace_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn row(name: &str, start_time: DateTime<Utc>) -> Trace {
        NewTrace::new(name, start_time).bind(Uuid::now_v7(), Uuid::now_v7(), "tester", Utc::now())
    }

    #[rstest]
    #[case("", true)]
    #[case("   ", false)]
    #[case("\t", false)]
    #[case("handler", false)]
    fn placeholder_requires_blank_name_at_epoch(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(row(name, Trace::PLACEHOLDER_START_TIME).is_placeholder(), expected);
    }

    #[test]
    fn blank_name_with_real_start_is_not_placeholder() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert!(!row("", start).is_placeholder());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_names_fail_validation(#[case] name: &str) {
        let err = NewTrace::new(name, Utc::now()).validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn named_request_validates() {
        assert!(NewTrace::new("handler", Trace::PLACEHOLDER_START_TIME).validate().is_ok());
    }

    #[test]
    fn bind_stamps_audit_fields() {
        let now = Utc::now();
        let id = Uuid::now_v7();
        let project_id = Uuid::now_v7();
        let trace = NewTrace::new("agent-run", now).bind(id, project_id, "alice", now);
        assert_eq!(trace.id, id);
        assert_eq!(trace.project_id, project_id);
        assert_eq!(trace.created_by, "alice");
        assert_eq!(trace.last_updated_by, "alice");
        assert_eq!(trace.created_at, trace.last_updated_at);
    }

    #[test]
    fn update_serializes_only_present_fields() {
        let update = TraceUpdate {
            output: Some(serde_json::json!({"answer": 42})),
            ..TraceUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"output": {"answer": 42}}));
        assert!(!update.is_empty());
        assert!(TraceUpdate::default().is_empty());
    }

    #[test]
    fn project_only_update_is_empty() {
        let update = TraceUpdate {
            project_name: Some("other".into()),
            ..TraceUpdate::default()
        };
        assert!(update.is_empty());
    }
}
