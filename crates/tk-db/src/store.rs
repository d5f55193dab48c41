//! `TraceStore` and `ProjectStore` backed by the libSQL repos.

use async_trait::async_trait;
use tk_core::entities::{Project, Trace, TracePage, TraceSearchCriteria, TraceUpdate, TraceWorkspace};
use tk_core::enums::EntityType;
use tk_core::errors::StoreError;
use tk_core::identity::RequestContext;
use tk_core::store::{ProjectStore, TraceStore};
use uuid::Uuid;

use crate::TraceDb;

#[async_trait]
impl TraceStore for TraceDb {
    async fn find_by_id(&self, workspace_id: &str, id: Uuid) -> Result<Option<Trace>, StoreError> {
        Ok(self.get_trace(workspace_id, id).await?)
    }

    async fn insert(&self, ctx: &RequestContext, trace: &Trace) -> Result<(), StoreError> {
        Ok(self.insert_trace(&ctx.workspace_id, trace).await?)
    }

    async fn partial_insert(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        id: Uuid,
        update: &TraceUpdate,
    ) -> Result<(), StoreError> {
        Ok(self.insert_placeholder(ctx, project_id, id, update).await?)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        id: Uuid,
        update: &TraceUpdate,
    ) -> Result<(), StoreError> {
        Ok(self.update_trace(ctx, project_id, id, update).await?)
    }

    async fn delete_feedback_scores(
        &self,
        workspace_id: &str,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<u64, StoreError> {
        Ok(self
            .delete_feedback_scores_for(workspace_id, entity_type, entity_id)
            .await?)
    }

    async fn delete_spans(&self, workspace_id: &str, trace_id: Uuid) -> Result<u64, StoreError> {
        Ok(self.delete_spans_for_trace(workspace_id, trace_id).await?)
    }

    async fn delete(&self, workspace_id: &str, id: Uuid) -> Result<(), StoreError> {
        let removed = self.delete_trace(workspace_id, id).await?;
        tracing::debug!(%id, removed, "deleted trace row");
        Ok(())
    }

    async fn find(
        &self,
        workspace_id: &str,
        project_id: Uuid,
        page: u32,
        size: u32,
        criteria: &TraceSearchCriteria,
    ) -> Result<TracePage, StoreError> {
        Ok(self
            .find_traces(workspace_id, project_id, page, size, criteria.exclude_placeholders)
            .await?)
    }

    async fn get_workspace_ownership(&self, ids: &[Uuid]) -> Result<Vec<TraceWorkspace>, StoreError> {
        Ok(self.trace_workspaces(ids).await?)
    }
}

#[async_trait]
impl ProjectStore for TraceDb {
    async fn get(&self, id: Uuid, workspace_id: &str) -> Result<Option<Project>, StoreError> {
        Ok(self.get_project(id, workspace_id).await?)
    }

    async fn create(&self, project: &Project) -> Result<(), StoreError> {
        Ok(self.create_project(project).await?)
    }

    async fn find_by_names(
        &self,
        workspace_id: &str,
        names: &[String],
    ) -> Result<Vec<Project>, StoreError> {
        Ok(self.find_projects_by_names(workspace_id, names).await?)
    }
}
