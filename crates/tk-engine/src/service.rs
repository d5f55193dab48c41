//! `TraceService`: the write-reconciliation entry point.
//!
//! Every mutation of a trace id runs under the `Trace-<id>` lease lock, so for
//! a single id the store sees one writer at a time. Project resolution happens
//! before the lock is taken; it is idempotent and never funnels unrelated ids
//! through one lock.

use std::sync::Arc;

use chrono::Utc;
use tk_config::GeneralConfig;
use tk_core::entities::{
    DEFAULT_PROJECT_NAME, NewTrace, Project, Trace, TracePage, TraceSearchCriteria, TraceUpdate,
    project_name_or_default,
};
use tk_core::enums::EntityType;
use tk_core::identity::RequestContext;
use tk_core::ids::{TRACE_KEY, generate_id, validate_version};
use tk_core::store::{LockKey, LockService, ProjectStore, TraceStore};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::TraceError;
use crate::lock::execute_with_lock;
use crate::projects::ProjectResolver;
use crate::resolver::{CreateDecision, UpdateDecision, resolve_create, resolve_update};

/// Tunables that are not about storage or locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub default_project_name: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_project_name: DEFAULT_PROJECT_NAME.to_string(),
            default_page_size: 10,
            max_page_size: 500,
        }
    }
}

impl From<&GeneralConfig> for EngineOptions {
    fn from(config: &GeneralConfig) -> Self {
        Self {
            default_project_name: config.default_project_name.clone(),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

impl EngineOptions {
    /// Zero means "use the default"; anything larger than the cap is clamped.
    #[must_use]
    pub fn page_size(&self, requested: u32) -> u32 {
        let size = if requested == 0 {
            self.default_page_size
        } else {
            requested
        };
        size.min(self.max_page_size)
    }
}

pub struct TraceService {
    traces: Arc<dyn TraceStore>,
    projects: ProjectResolver,
    locks: Arc<dyn LockService>,
    options: EngineOptions,
}

fn trace_lock(id: Uuid) -> LockKey {
    LockKey::new(id, TRACE_KEY)
}

impl TraceService {
    #[must_use]
    pub fn new(
        traces: Arc<dyn TraceStore>,
        projects: Arc<dyn ProjectStore>,
        locks: Arc<dyn LockService>,
        options: EngineOptions,
    ) -> Self {
        Self {
            traces,
            projects: ProjectResolver::new(projects),
            locks,
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn project_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        project_name_or_default(requested, &self.options.default_project_name)
    }

    /// Create a trace, or complete the placeholder a patch left for its id.
    ///
    /// Returns the trace id, generated when the request carries none.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentifier` for a supplied id that is not UUID v7 (no I/O done)
    /// - `InvalidRequest` for a blank name (no I/O done)
    /// - `DuplicateEntity` if a realized trace with this id exists in the project
    /// - `IdentifierConflict` if the id is bound to another project or workspace
    /// - `Lock` / `Store` for lock or backend failures
    #[instrument(skip_all, fields(workspace = %ctx.workspace_id, trace_id))]
    pub async fn create(&self, ctx: &RequestContext, request: &NewTrace) -> Result<Uuid, TraceError> {
        let id = request.id.unwrap_or_else(generate_id);
        tracing::Span::current().record("trace_id", tracing::field::display(id));
        validate_version(id, TRACE_KEY)?;
        request.validate().map_err(TraceError::InvalidRequest)?;

        let name = self.project_name(request.project_name.as_deref());
        let project = self.projects.get_or_create(ctx, name).await?;

        execute_with_lock(
            self.locks.as_ref(),
            &trace_lock(id),
            self.create_locked(ctx, request, id, &project),
        )
        .await?;
        Ok(id)
    }

    async fn create_locked(
        &self,
        ctx: &RequestContext,
        request: &NewTrace,
        id: Uuid,
        project: &Project,
    ) -> Result<(), TraceError> {
        let existing = self.traces.find_by_id(&ctx.workspace_id, id).await?;
        let decision = resolve_create(existing.as_ref(), project.id);
        debug!(%id, project_id = %project.id, decision = decision.as_str(), "create resolved");

        match decision {
            CreateDecision::Insert | CreateDecision::CompletePlaceholder => {
                let trace = request.bind(id, project.id, &ctx.user_name, Utc::now());
                self.traces.insert(ctx, &trace).await.inspect_err(|e| {
                    warn!(%id, error = %e, "trace insert rejected");
                })?;
                if decision == CreateDecision::CompletePlaceholder {
                    info!(%id, project_id = %project.id, "completed placeholder trace");
                }
                Ok(())
            }
            CreateDecision::RejectDuplicate => {
                warn!(%id, "trace already exists");
                Err(TraceError::DuplicateEntity { id })
            }
            CreateDecision::RejectConflict => {
                warn!(%id, project_id = %project.id, "trace id bound to another project");
                Err(TraceError::IdentifierConflict { id })
            }
        }
    }

    /// Apply a patch to trace `id`, writing a placeholder if it does not exist yet.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentifier` for an id that is not UUID v7 (no I/O done)
    /// - `ProjectNotFound` if `patch.project_id` names no project in the workspace
    /// - `IdentifierConflict` if the id is bound to another project or workspace
    /// - `Lock` / `Store` for lock or backend failures
    #[instrument(skip_all, fields(workspace = %ctx.workspace_id, trace_id = %id))]
    pub async fn update(&self, ctx: &RequestContext, id: Uuid, patch: &TraceUpdate) -> Result<(), TraceError> {
        validate_version(id, TRACE_KEY)?;

        let project = match patch.project_id {
            Some(project_id) => self.projects.get(ctx, project_id).await?,
            None => {
                let name = self.project_name(patch.project_name.as_deref());
                self.projects.get_or_create(ctx, name).await?
            }
        };

        execute_with_lock(
            self.locks.as_ref(),
            &trace_lock(id),
            self.update_locked(ctx, id, patch, &project),
        )
        .await
    }

    async fn update_locked(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        patch: &TraceUpdate,
        project: &Project,
    ) -> Result<(), TraceError> {
        let existing = self.traces.find_by_id(&ctx.workspace_id, id).await?;
        let decision = resolve_update(existing.as_ref(), project.id);
        debug!(%id, project_id = %project.id, decision = decision.as_str(), "update resolved");

        match decision {
            UpdateDecision::Apply => {
                self.traces.update(ctx, project.id, id, patch).await.inspect_err(|e| {
                    warn!(%id, error = %e, "trace update rejected");
                })?;
                Ok(())
            }
            UpdateDecision::InsertPlaceholder => {
                self.traces
                    .partial_insert(ctx, project.id, id, patch)
                    .await
                    .inspect_err(|e| warn!(%id, error = %e, "placeholder insert rejected"))?;
                info!(%id, project_id = %project.id, "wrote placeholder trace ahead of create");
                Ok(())
            }
            UpdateDecision::RejectConflict => {
                warn!(%id, project_id = %project.id, "trace id bound to another project");
                Err(TraceError::IdentifierConflict { id })
            }
        }
    }

    /// # Errors
    ///
    /// `NotFound` if no trace with this id exists in the caller's workspace.
    #[instrument(skip_all, fields(workspace = %ctx.workspace_id, trace_id = %id))]
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<Trace, TraceError> {
        self.traces
            .find_by_id(&ctx.workspace_id, id)
            .await?
            .ok_or(TraceError::NotFound { id })
    }

    /// Remove a trace: feedback scores first, then spans, then the trace row.
    ///
    /// A failure part way leaves the trace row in place, so the call can be
    /// retried. Deleting an absent id succeeds.
    ///
    /// # Errors
    ///
    /// `Lock` / `Store` for lock or backend failures.
    #[instrument(skip_all, fields(workspace = %ctx.workspace_id, trace_id = %id))]
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), TraceError> {
        execute_with_lock(self.locks.as_ref(), &trace_lock(id), self.delete_locked(ctx, id)).await
    }

    async fn delete_locked(&self, ctx: &RequestContext, id: Uuid) -> Result<(), TraceError> {
        let workspace = ctx.workspace_id.as_str();
        let scores = self
            .traces
            .delete_feedback_scores(workspace, EntityType::Trace, id)
            .await?;
        let spans = self.traces.delete_spans(workspace, id).await?;
        self.traces.delete(workspace, id).await?;
        debug!(%id, scores, spans, "deleted trace");
        Ok(())
    }

    /// One page of traces, newest first.
    ///
    /// An explicit `criteria.project_id` is queried directly. Otherwise the
    /// project is looked up by name (default name when blank) and a missing
    /// project yields an empty page.
    ///
    /// # Errors
    ///
    /// `Store` for backend failures.
    #[instrument(skip_all, fields(workspace = %ctx.workspace_id, page = page, size = size))]
    pub async fn find(
        &self,
        ctx: &RequestContext,
        page: u32,
        size: u32,
        criteria: &TraceSearchCriteria,
    ) -> Result<TracePage, TraceError> {
        let size = self.options.page_size(size);
        let project_id = match criteria.project_id {
            Some(project_id) => project_id,
            None => {
                let name = self.project_name(criteria.project_name.as_deref());
                match self.projects.find(ctx, name).await? {
                    Some(project) => project.id,
                    None => {
                        debug!(project = name, "no such project, returning empty page");
                        return Ok(TracePage::empty(page.max(1)));
                    }
                }
            }
        };
        Ok(self
            .traces
            .find(&ctx.workspace_id, project_id, page, size, criteria)
            .await?)
    }

    /// True when every listed id that exists is owned by `workspace_id`.
    ///
    /// An empty list validates. Ids that do not exist are ignored.
    ///
    /// # Errors
    ///
    /// `Store` for backend failures.
    #[instrument(skip_all, fields(workspace = workspace_id, ids = ids.len()))]
    pub async fn validate_workspace_ownership(
        &self,
        workspace_id: &str,
        ids: &[Uuid],
    ) -> Result<bool, TraceError> {
        if ids.is_empty() {
            return Ok(true);
        }
        let owners = self.traces.get_workspace_ownership(ids).await?;
        let foreign = owners
            .iter()
            .filter(|owner| owner.workspace_id != workspace_id)
            .count();
        if foreign > 0 {
            warn!(foreign, "ids owned by another workspace");
        }
        Ok(foreign == 0)
    }
}
