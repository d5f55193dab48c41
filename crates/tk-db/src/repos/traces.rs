//! Trace repository: point lookup, guarded upserts, partial updates, paging.
//!
//! Every write carries the caller's `(project_id, workspace_id)` binding and
//! only touches a row that already has the same binding. A write that finds the
//! id under another binding returns no `RETURNING` row, which surfaces as
//! `DatabaseError::BindingMismatch`.

use chrono::Utc;
use tk_core::entities::{Trace, TracePage, TraceUpdate, TraceWorkspace};
use tk_core::identity::RequestContext;
use uuid::Uuid;

use crate::TraceDb;
use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, json_text, parse_datetime, parse_optional_datetime,
    parse_optional_json, parse_tags, parse_uuid, tags_text,
};

const SELECT_COLS: &str = "id, project_id, name, start_time, end_time, input, output, metadata, \
     tags, created_at, last_updated_at, created_by, last_updated_by";

fn row_to_trace(row: &libsql::Row) -> Result<Trace, DatabaseError> {
    let end_time = get_opt_string(row, 4)?;
    let input = get_opt_string(row, 5)?;
    let output = get_opt_string(row, 6)?;
    let metadata = get_opt_string(row, 7)?;
    Ok(Trace {
        id: parse_uuid(&row.get::<String>(0)?)?,
        project_id: parse_uuid(&row.get::<String>(1)?)?,
        name: row.get::<String>(2)?,
        start_time: parse_datetime(&row.get::<String>(3)?)?,
        end_time: parse_optional_datetime(end_time.as_deref())?,
        input: parse_optional_json(input.as_deref())?,
        output: parse_optional_json(output.as_deref())?,
        metadata: parse_optional_json(metadata.as_deref())?,
        tags: parse_tags(&row.get::<String>(8)?)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
        last_updated_at: parse_datetime(&row.get::<String>(10)?)?,
        created_by: row.get::<String>(11)?,
        last_updated_by: row.get::<String>(12)?,
    })
}

impl TraceDb {
    pub async fn get_trace(
        &self,
        workspace_id: &str,
        id: Uuid,
    ) -> Result<Option<Trace>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM traces WHERE workspace_id = ?1 AND id = ?2"),
                libsql::params![workspace_id, id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_trace(&row)?)),
            None => Ok(None),
        }
    }

    /// Write the full row. An existing row with the same binding is replaced
    /// field for field; the stored row afterwards equals `trace`.
    pub async fn insert_trace(&self, workspace_id: &str, trace: &Trace) -> Result<(), DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "INSERT INTO traces (id, workspace_id, project_id, name, start_time, end_time,
                     input, output, metadata, tags, created_at, last_updated_at, created_by, last_updated_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     start_time = excluded.start_time,
                     end_time = excluded.end_time,
                     input = excluded.input,
                     output = excluded.output,
                     metadata = excluded.metadata,
                     tags = excluded.tags,
                     created_at = excluded.created_at,
                     last_updated_at = excluded.last_updated_at,
                     created_by = excluded.created_by,
                     last_updated_by = excluded.last_updated_by
                 WHERE traces.project_id = excluded.project_id
                   AND traces.workspace_id = excluded.workspace_id
                 RETURNING id",
                libsql::params![
                    trace.id.to_string(),
                    workspace_id,
                    trace.project_id.to_string(),
                    trace.name.as_str(),
                    format_datetime(&trace.start_time),
                    trace.end_time.as_ref().map(format_datetime),
                    json_text(trace.input.as_ref()),
                    json_text(trace.output.as_ref()),
                    json_text(trace.metadata.as_ref()),
                    tags_text(&trace.tags)?,
                    format_datetime(&trace.created_at),
                    format_datetime(&trace.last_updated_at),
                    trace.created_by.as_str(),
                    trace.last_updated_by.as_str()
                ],
            )
            .await?;
        if rows.next().await?.is_none() {
            return Err(DatabaseError::BindingMismatch { id: trace.id });
        }
        Ok(())
    }

    /// Write a placeholder row carrying the patch fields.
    ///
    /// If a row with the same binding appeared in the meantime, the patch
    /// fields are applied to it instead.
    pub async fn insert_placeholder(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        id: Uuid,
        update: &TraceUpdate,
    ) -> Result<(), DatabaseError> {
        let now = format_datetime(&Utc::now());
        let tags = update.tags.as_ref().map(tags_text).transpose()?;
        let mut rows = self
            .conn()
            .query(
                "INSERT INTO traces (id, workspace_id, project_id, name, start_time, end_time,
                     input, output, metadata, tags, created_at, last_updated_at, created_by, last_updated_by)
                 VALUES (?1, ?2, ?3, '', ?4, ?5, ?6, ?7, ?8, COALESCE(?9, '[]'), ?10, ?10, ?11, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                     end_time = COALESCE(?5, traces.end_time),
                     input = COALESCE(?6, traces.input),
                     output = COALESCE(?7, traces.output),
                     metadata = COALESCE(?8, traces.metadata),
                     tags = COALESCE(?9, traces.tags),
                     last_updated_at = ?10,
                     last_updated_by = ?11
                 WHERE traces.project_id = excluded.project_id
                   AND traces.workspace_id = excluded.workspace_id
                 RETURNING id",
                libsql::params![
                    id.to_string(),
                    ctx.workspace_id.as_str(),
                    project_id.to_string(),
                    format_datetime(&Trace::PLACEHOLDER_START_TIME),
                    update.end_time.as_ref().map(format_datetime),
                    json_text(update.input.as_ref()),
                    json_text(update.output.as_ref()),
                    json_text(update.metadata.as_ref()),
                    tags,
                    now,
                    ctx.user_name.as_str()
                ],
            )
            .await?;
        if rows.next().await?.is_none() {
            return Err(DatabaseError::BindingMismatch { id });
        }
        Ok(())
    }

    /// Apply the `Some` fields of `update` to the row bound to `project_id`.
    pub async fn update_trace(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        id: Uuid,
        update: &TraceUpdate,
    ) -> Result<(), DatabaseError> {
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref end_time) = update.end_time {
            sets.push(format!("end_time = ?{idx}"));
            params.push(format_datetime(end_time).into());
            idx += 1;
        }
        if let Some(ref input) = update.input {
            sets.push(format!("input = ?{idx}"));
            params.push(input.to_string().into());
            idx += 1;
        }
        if let Some(ref output) = update.output {
            sets.push(format!("output = ?{idx}"));
            params.push(output.to_string().into());
            idx += 1;
        }
        if let Some(ref metadata) = update.metadata {
            sets.push(format!("metadata = ?{idx}"));
            params.push(metadata.to_string().into());
            idx += 1;
        }
        if let Some(ref tags) = update.tags {
            sets.push(format!("tags = ?{idx}"));
            params.push(tags_text(tags)?.into());
            idx += 1;
        }

        sets.push(format!("last_updated_at = ?{idx}"));
        params.push(format_datetime(&Utc::now()).into());
        idx += 1;
        sets.push(format!("last_updated_by = ?{idx}"));
        params.push(ctx.user_name.clone().into());
        idx += 1;

        params.push(id.to_string().into());
        params.push(ctx.workspace_id.clone().into());
        params.push(project_id.to_string().into());
        let sql = format!(
            "UPDATE traces SET {} WHERE id = ?{} AND workspace_id = ?{} AND project_id = ?{} RETURNING id",
            sets.join(", "),
            idx,
            idx + 1,
            idx + 2
        );

        let mut rows = self
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        if rows.next().await?.is_none() {
            return Err(DatabaseError::BindingMismatch { id });
        }
        Ok(())
    }

    /// Remove the trace row. Returns how many rows were removed (0 or 1).
    pub async fn delete_trace(&self, workspace_id: &str, id: Uuid) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "DELETE FROM traces WHERE workspace_id = ?1 AND id = ?2 RETURNING id",
                libsql::params![workspace_id, id.to_string()],
            )
            .await?;
        let mut removed = 0;
        while rows.next().await?.is_some() {
            removed += 1;
        }
        Ok(removed)
    }

    /// One page of traces in a project, newest id first. `page` is 1-based.
    pub async fn find_traces(
        &self,
        workspace_id: &str,
        project_id: Uuid,
        page: u32,
        size: u32,
        exclude_placeholders: bool,
    ) -> Result<TracePage, DatabaseError> {
        let mut filter = String::from("workspace_id = ?1 AND project_id = ?2");
        let mut params: Vec<libsql::Value> =
            vec![workspace_id.to_string().into(), project_id.to_string().into()];
        if exclude_placeholders {
            filter.push_str(" AND NOT (name = '' AND start_time = ?3)");
            params.push(format_datetime(&Trace::PLACEHOLDER_START_TIME).into());
        }

        let mut count_rows = self
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM traces WHERE {filter}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total = count_rows
            .next()
            .await?
            .ok_or(DatabaseError::NoResult)?
            .get::<i64>(0)?;

        let page = page.max(1);
        let limit_idx = params.len() + 1;
        params.push(i64::from(size).into());
        params.push((i64::from(page - 1) * i64::from(size)).into());
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM traces WHERE {filter}
                     ORDER BY id DESC LIMIT ?{limit_idx} OFFSET ?{}",
                    limit_idx + 1
                ),
                libsql::params_from_iter(params),
            )
            .await?;

        let mut content = Vec::new();
        while let Some(row) = rows.next().await? {
            content.push(row_to_trace(&row)?);
        }

        Ok(TracePage {
            page,
            size: u32::try_from(content.len())
                .map_err(|e| DatabaseError::InvalidState(e.to_string()))?,
            total: u64::try_from(total).map_err(|e| DatabaseError::InvalidState(e.to_string()))?,
            content,
        })
    }

    /// Owning workspace of each listed id that exists, in any workspace.
    pub async fn trace_workspaces(&self, ids: &[Uuid]) -> Result<Vec<TraceWorkspace>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (1..=ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let params: Vec<libsql::Value> = ids.iter().map(|id| id.to_string().into()).collect();
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT id, workspace_id FROM traces WHERE id IN ({placeholders})"),
                libsql::params_from_iter(params),
            )
            .await?;

        let mut owners = Vec::new();
        while let Some(row) = rows.next().await? {
            owners.push(TraceWorkspace {
                id: parse_uuid(&row.get::<String>(0)?)?,
                workspace_id: row.get::<String>(1)?,
            });
        }
        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{seed_project, test_ctx, test_db};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use tk_core::entities::NewTrace;

    fn new_trace(project_id: Uuid, name: &str) -> Trace {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut request = NewTrace::new(name, start);
        request.input = Some(serde_json::json!({"q": "ping"}));
        request.tags = BTreeSet::from(["prod".to_string()]);
        request.bind(Uuid::now_v7(), project_id, "alice", Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 1).unwrap())
    }

    #[tokio::test]
    async fn insert_and_get_trace() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let project = seed_project(&db, &ctx, "checkout").await;
        let trace = new_trace(project.id, "handler");

        db.insert_trace(&ctx.workspace_id, &trace).await.unwrap();
        let fetched = db.get_trace("ws-a", trace.id).await.unwrap().unwrap();
        assert_eq!(fetched, trace);
    }

    #[tokio::test]
    async fn get_is_workspace_scoped() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let project = seed_project(&db, &ctx, "checkout").await;
        let trace = new_trace(project.id, "handler");
        db.insert_trace(&ctx.workspace_id, &trace).await.unwrap();

        assert!(db.get_trace("ws-b", trace.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_under_other_project_is_binding_mismatch() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let first = seed_project(&db, &ctx, "one").await;
        let second = seed_project(&db, &ctx, "two").await;
        let trace = new_trace(first.id, "handler");
        db.insert_trace(&ctx.workspace_id, &trace).await.unwrap();

        let clash = Trace {
            project_id: second.id,
            name: "other".into(),
            ..trace.clone()
        };
        let err = db.insert_trace(&ctx.workspace_id, &clash).await.unwrap_err();
        assert!(matches!(err, DatabaseError::BindingMismatch { id } if id == trace.id));

        let stored = db.get_trace("ws-a", trace.id).await.unwrap().unwrap();
        assert_eq!(stored, trace);
    }

    #[tokio::test]
    async fn insert_from_other_workspace_is_binding_mismatch() {
        let db = test_db().await;
        let ctx_a = test_ctx("ws-a");
        let ctx_b = test_ctx("ws-b");
        let project_a = seed_project(&db, &ctx_a, "shared-name").await;
        let trace = new_trace(project_a.id, "handler");
        db.insert_trace(&ctx_a.workspace_id, &trace).await.unwrap();

        let err = db.insert_trace(&ctx_b.workspace_id, &trace).await.unwrap_err();
        assert!(matches!(err, DatabaseError::BindingMismatch { .. }));
    }

    #[tokio::test]
    async fn placeholder_then_full_insert_replaces_every_field() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let project = seed_project(&db, &ctx, "checkout").await;
        let id = Uuid::now_v7();
        let patch = TraceUpdate {
            output: Some(serde_json::json!({"partial": true})),
            metadata: Some(serde_json::json!({"k": "v"})),
            ..TraceUpdate::default()
        };
        db.insert_placeholder(&ctx, project.id, id, &patch).await.unwrap();

        let placeholder = db.get_trace("ws-a", id).await.unwrap().unwrap();
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.output, patch.output);

        let full = Trace {
            id,
            ..new_trace(project.id, "handler")
        };
        db.insert_trace(&ctx.workspace_id, &full).await.unwrap();
        let realized = db.get_trace("ws-a", id).await.unwrap().unwrap();
        assert_eq!(realized, full);
        assert!(realized.metadata.is_none());
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let project = seed_project(&db, &ctx, "checkout").await;
        let trace = new_trace(project.id, "handler");
        db.insert_trace(&ctx.workspace_id, &trace).await.unwrap();

        let editor = RequestContext::new("ws-a", "acme", "bob");
        let patch = TraceUpdate {
            output: Some(serde_json::json!({"answer": "pong"})),
            tags: Some(BTreeSet::from(["prod".to_string(), "slow".to_string()])),
            ..TraceUpdate::default()
        };
        db.update_trace(&editor, project.id, trace.id, &patch).await.unwrap();

        let updated = db.get_trace("ws-a", trace.id).await.unwrap().unwrap();
        assert_eq!(updated.output, patch.output);
        assert_eq!(updated.tags.len(), 2);
        assert_eq!(updated.input, trace.input);
        assert_eq!(updated.name, "handler");
        assert_eq!(updated.last_updated_by, "bob");
        assert_eq!(updated.created_by, "alice");
    }

    #[tokio::test]
    async fn update_with_wrong_project_touches_nothing() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let project = seed_project(&db, &ctx, "checkout").await;
        let other = seed_project(&db, &ctx, "billing").await;
        let trace = new_trace(project.id, "handler");
        db.insert_trace(&ctx.workspace_id, &trace).await.unwrap();

        let patch = TraceUpdate {
            output: Some(serde_json::json!("x")),
            ..TraceUpdate::default()
        };
        let err = db.update_trace(&ctx, other.id, trace.id, &patch).await.unwrap_err();
        assert!(matches!(err, DatabaseError::BindingMismatch { .. }));
        assert_eq!(db.get_trace("ws-a", trace.id).await.unwrap().unwrap(), trace);
    }

    #[tokio::test]
    async fn find_pages_newest_first_and_hides_placeholders_on_request() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let project = seed_project(&db, &ctx, "checkout").await;
        let mut ids = Vec::new();
        for i in 0..3 {
            let trace = new_trace(project.id, &format!("t{i}"));
            ids.push(trace.id);
            db.insert_trace(&ctx.workspace_id, &trace).await.unwrap();
        }
        let placeholder_id = Uuid::now_v7();
        db.insert_placeholder(&ctx, project.id, placeholder_id, &TraceUpdate::default())
            .await
            .unwrap();

        let all = db.find_traces("ws-a", project.id, 1, 10, false).await.unwrap();
        assert_eq!(all.total, 4);
        assert_eq!(all.content[0].id, placeholder_id);

        let realized = db.find_traces("ws-a", project.id, 1, 2, true).await.unwrap();
        assert_eq!(realized.total, 3);
        assert_eq!(realized.size, 2);
        assert_eq!(realized.content[0].id, ids[2]);
        assert_eq!(realized.content[1].id, ids[1]);

        let second = db.find_traces("ws-a", project.id, 2, 2, true).await.unwrap();
        assert_eq!(second.content.len(), 1);
        assert_eq!(second.content[0].id, ids[0]);
    }

    #[tokio::test]
    async fn whitespace_named_epoch_row_is_realized_in_rust_and_sql() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let project = seed_project(&db, &ctx, "checkout").await;
        let tabbed = NewTrace::new("\t", Trace::PLACEHOLDER_START_TIME).bind(
            Uuid::now_v7(),
            project.id,
            "alice",
            Utc::now(),
        );
        db.insert_trace(&ctx.workspace_id, &tabbed).await.unwrap();
        let placeholder_id = Uuid::now_v7();
        db.insert_placeholder(&ctx, project.id, placeholder_id, &TraceUpdate::default())
            .await
            .unwrap();

        let stored = db.get_trace("ws-a", tabbed.id).await.unwrap().unwrap();
        assert!(!stored.is_placeholder());
        assert!(db.get_trace("ws-a", placeholder_id).await.unwrap().unwrap().is_placeholder());

        let realized = db.find_traces("ws-a", project.id, 1, 10, true).await.unwrap();
        let ids: Vec<_> = realized.content.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![tabbed.id]);
    }

    #[tokio::test]
    async fn trace_workspaces_reports_existing_ids_only() {
        let db = test_db().await;
        let ctx_a = test_ctx("ws-a");
        let ctx_b = test_ctx("ws-b");
        let pa = seed_project(&db, &ctx_a, "p").await;
        let pb = seed_project(&db, &ctx_b, "p").await;
        let ta = new_trace(pa.id, "a");
        let tb = new_trace(pb.id, "b");
        db.insert_trace("ws-a", &ta).await.unwrap();
        db.insert_trace("ws-b", &tb).await.unwrap();

        let mut owners = db
            .trace_workspaces(&[ta.id, tb.id, Uuid::now_v7()])
            .await
            .unwrap();
        owners.sort_by(|x, y| x.workspace_id.cmp(&y.workspace_id));
        assert_eq!(
            owners,
            vec![
                TraceWorkspace { id: ta.id, workspace_id: "ws-a".into() },
                TraceWorkspace { id: tb.id, workspace_id: "ws-b".into() },
            ]
        );
        assert!(db.trace_workspaces(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_trace_reports_removed_rows() {
        let db = test_db().await;
        let ctx = test_ctx("ws-a");
        let project = seed_project(&db, &ctx, "checkout").await;
        let trace = new_trace(project.id, "handler");
        db.insert_trace("ws-a", &trace).await.unwrap();

        assert_eq!(db.delete_trace("ws-b", trace.id).await.unwrap(), 0);
        assert_eq!(db.delete_trace("ws-a", trace.id).await.unwrap(), 1);
        assert_eq!(db.delete_trace("ws-a", trace.id).await.unwrap(), 0);
    }
}
