//! Shared test utilities for tk-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use chrono::{TimeZone, Utc};
    use tk_core::entities::{FeedbackScore, Project, Span};
    use tk_core::enums::{EntityType, ScoreSource};
    use tk_core::identity::RequestContext;
    use uuid::Uuid;

    use crate::TraceDb;

    /// Create an in-memory database with migrations applied.
    pub async fn test_db() -> TraceDb {
        TraceDb::open_local(":memory:").await.unwrap()
    }

    pub fn test_ctx(workspace_id: &str) -> RequestContext {
        RequestContext::new(workspace_id, format!("{workspace_id}-name"), "alice")
    }

    pub fn project_named(workspace_id: &str, name: &str) -> Project {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Project {
            id: Uuid::now_v7(),
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            description: None,
            created_at: now,
            created_by: "alice".to_string(),
            last_updated_at: now,
            last_updated_by: "alice".to_string(),
        }
    }

    /// Insert a project in the context's workspace and return it.
    pub async fn seed_project(db: &TraceDb, ctx: &RequestContext, name: &str) -> Project {
        let project = project_named(&ctx.workspace_id, name);
        db.create_project(&project).await.unwrap();
        project
    }

    pub fn span_for(trace_id: Uuid, project_id: Uuid, parent: Option<Uuid>) -> Span {
        Span {
            id: Uuid::now_v7(),
            trace_id,
            project_id,
            parent_span_id: parent,
            name: "llm-call".to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            end_time: None,
        }
    }

    pub fn score_for(trace_id: Uuid, project_id: Uuid, name: &str, value: f64) -> FeedbackScore {
        FeedbackScore {
            entity_id: trace_id,
            entity_type: EntityType::Trace,
            project_id,
            name: name.to_string(),
            value,
            reason: None,
            source: ScoreSource::Sdk,
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
        }
    }
}
