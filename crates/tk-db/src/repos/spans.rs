//! Span repository. Spans only matter here as rows that must go before
//! their trace on delete.

use tk_core::entities::Span;
use uuid::Uuid;

use crate::TraceDb;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, parse_datetime, parse_optional_datetime, parse_uuid};

fn row_to_span(row: &libsql::Row) -> Result<Span, DatabaseError> {
    let parent = get_opt_string(row, 3)?;
    let end_time = get_opt_string(row, 6)?;
    Ok(Span {
        id: parse_uuid(&row.get::<String>(0)?)?,
        trace_id: parse_uuid(&row.get::<String>(1)?)?,
        project_id: parse_uuid(&row.get::<String>(2)?)?,
        parent_span_id: parent.as_deref().map(parse_uuid).transpose()?,
        name: row.get::<String>(4)?,
        start_time: parse_datetime(&row.get::<String>(5)?)?,
        end_time: parse_optional_datetime(end_time.as_deref())?,
    })
}

impl TraceDb {
    pub async fn insert_span(&self, workspace_id: &str, span: &Span) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO spans (id, workspace_id, project_id, trace_id, parent_span_id, name,
                     start_time, end_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                libsql::params![
                    span.id.to_string(),
                    workspace_id,
                    span.project_id.to_string(),
                    span.trace_id.to_string(),
                    span.parent_span_id.map(|id| id.to_string()),
                    span.name.as_str(),
                    format_datetime(&span.start_time),
                    span.end_time.as_ref().map(format_datetime)
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_spans(
        &self,
        workspace_id: &str,
        trace_id: Uuid,
    ) -> Result<Vec<Span>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, trace_id, project_id, parent_span_id, name, start_time, end_time
                 FROM spans WHERE workspace_id = ?1 AND trace_id = ?2 ORDER BY id",
                libsql::params![workspace_id, trace_id.to_string()],
            )
            .await?;
        let mut spans = Vec::new();
        while let Some(row) = rows.next().await? {
            spans.push(row_to_span(&row)?);
        }
        Ok(spans)
    }

    /// Remove every span of `trace_id`. Returns rows removed.
    pub async fn delete_spans_for_trace(
        &self,
        workspace_id: &str,
        trace_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "DELETE FROM spans WHERE workspace_id = ?1 AND trace_id = ?2 RETURNING 1",
                libsql::params![workspace_id, trace_id.to_string()],
            )
            .await?;
        let mut removed = 0;
        while rows.next().await?.is_some() {
            removed += 1;
        }
        Ok(removed)
    }
}
