//! Project resolution by id or by name, creating on first use.
//!
//! Name resolution takes no lock. Concurrent callers race on the store's
//! unique `(workspace_id, name)` key; the losers re-read the winner's row.

use std::sync::Arc;

use chrono::Utc;
use tk_core::entities::Project;
use tk_core::errors::StoreError;
use tk_core::identity::RequestContext;
use tk_core::ids::generate_id;
use tk_core::store::ProjectStore;
use uuid::Uuid;

use crate::error::TraceError;

pub struct ProjectResolver {
    store: Arc<dyn ProjectStore>,
}

impl ProjectResolver {
    #[must_use]
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    async fn find_by_name(&self, workspace_id: &str, name: &str) -> Result<Option<Project>, TraceError> {
        let found = self
            .store
            .find_by_names(workspace_id, &[name.to_string()])
            .await?;
        Ok(found.into_iter().find(|p| p.name == name))
    }

    /// Return the project called `name` in the caller's workspace, creating it
    /// if absent.
    ///
    /// # Errors
    ///
    /// `TraceError::ProjectUnavailable` if a concurrent create won but its row
    /// cannot be read back; `TraceError::Store` for backend failures.
    pub async fn get_or_create(&self, ctx: &RequestContext, name: &str) -> Result<Project, TraceError> {
        if let Some(existing) = self.find_by_name(&ctx.workspace_id, name).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let project = Project {
            id: generate_id(),
            workspace_id: ctx.workspace_id.clone(),
            name: name.to_string(),
            description: None,
            created_at: now,
            created_by: ctx.user_name.clone(),
            last_updated_at: now,
            last_updated_by: ctx.user_name.clone(),
        };

        match self.store.create(&project).await {
            Ok(()) => {
                tracing::info!(project_id = %project.id, name, workspace = %ctx.workspace_id, "created project");
                Ok(project)
            }
            Err(StoreError::AlreadyExists { .. }) => {
                tracing::debug!(name, workspace = %ctx.workspace_id, "lost project create race, re-reading");
                self.find_by_name(&ctx.workspace_id, name)
                    .await?
                    .ok_or_else(|| {
                        tracing::warn!(name, workspace = %ctx.workspace_id, "project missing after create race");
                        TraceError::ProjectUnavailable {
                            name: name.to_string(),
                        }
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a project by id within the caller's workspace.
    ///
    /// # Errors
    ///
    /// `TraceError::ProjectNotFound` if no such project exists in the workspace.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<Project, TraceError> {
        self.store
            .get(id, &ctx.workspace_id)
            .await?
            .ok_or(TraceError::ProjectNotFound { id })
    }

    /// Look up a project by name without creating it.
    ///
    /// # Errors
    ///
    /// Backend failures only; a missing project is `Ok(None)`.
    pub async fn find(&self, ctx: &RequestContext, name: &str) -> Result<Option<Project>, TraceError> {
        self.find_by_name(&ctx.workspace_id, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{ctx, test_db};
    use futures::future::join_all;
    use std::collections::HashSet;

    #[tokio::test]
    async fn creates_once_then_reuses() {
        let db = test_db().await;
        let resolver = ProjectResolver::new(db.clone());
        let ctx = ctx("ws-a");

        let first = resolver.get_or_create(&ctx, "checkout").await.unwrap();
        let second = resolver.get_or_create(&ctx, "checkout").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_by, "tester");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolution_yields_one_project() {
        let db = test_db().await;
        let resolver = Arc::new(ProjectResolver::new(db.clone()));

        let calls = (0..16).map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.get_or_create(&ctx("ws-a"), "proj").await })
        });
        let ids: HashSet<Uuid> = join_all(calls)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().id)
            .collect();

        assert_eq!(ids.len(), 1);
        let stored = db
            .find_projects_by_names("ws-a", &["proj".to_string()])
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert!(ids.contains(&stored[0].id));
    }

    #[tokio::test]
    async fn get_is_workspace_scoped() {
        let db = test_db().await;
        let resolver = ProjectResolver::new(db.clone());
        let project = resolver.get_or_create(&ctx("ws-a"), "p").await.unwrap();

        assert_eq!(resolver.get(&ctx("ws-a"), project.id).await.unwrap().id, project.id);
        let err = resolver.get(&ctx("ws-b"), project.id).await.unwrap_err();
        assert!(matches!(err, TraceError::ProjectNotFound { id } if id == project.id));
    }

    /// Reports every name as taken but never returns it.
    struct VanishingProjects;

    #[async_trait::async_trait]
    impl ProjectStore for VanishingProjects {
        async fn get(&self, _id: Uuid, _workspace_id: &str) -> Result<Option<Project>, StoreError> {
            Ok(None)
        }

        async fn create(&self, project: &Project) -> Result<(), StoreError> {
            Err(StoreError::AlreadyExists {
                entity: "project".into(),
                key: project.name.clone(),
            })
        }

        async fn find_by_names(&self, _workspace_id: &str, _names: &[String]) -> Result<Vec<Project>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn missing_reread_after_race_is_retryable() {
        let resolver = ProjectResolver::new(Arc::new(VanishingProjects));
        let err = resolver.get_or_create(&ctx("ws-a"), "p").await.unwrap_err();
        assert!(matches!(err, TraceError::ProjectUnavailable { ref name } if name == "p"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn find_does_not_create() {
        let db = test_db().await;
        let resolver = ProjectResolver::new(db.clone());
        assert!(resolver.find(&ctx("ws-a"), "ghost").await.unwrap().is_none());
        assert!(
            db.find_projects_by_names("ws-a", &["ghost".to_string()])
                .await
                .unwrap()
                .is_empty()
        );
    }
}
