//! Project registry: create-if-absent and lookups by id or name.

use tk_core::entities::Project;
use uuid::Uuid;

use crate::TraceDb;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, parse_datetime, parse_uuid};

const SELECT_COLS: &str = "id, workspace_id, name, description, created_at, created_by, \
     last_updated_at, last_updated_by";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: parse_uuid(&row.get::<String>(0)?)?,
        workspace_id: row.get::<String>(1)?,
        name: row.get::<String>(2)?,
        description: row.get::<Option<String>>(3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        created_by: row.get::<String>(5)?,
        last_updated_at: parse_datetime(&row.get::<String>(6)?)?,
        last_updated_by: row.get::<String>(7)?,
    })
}

impl TraceDb {
    /// Insert a project. A taken `(workspace_id, name)` yields
    /// `DatabaseError::AlreadyExists` and leaves the existing row alone.
    pub async fn create_project(&self, project: &Project) -> Result<(), DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "INSERT INTO projects (id, workspace_id, name, description, created_at, created_by,
                     last_updated_at, last_updated_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(workspace_id, name) DO NOTHING
                 RETURNING id",
                libsql::params![
                    project.id.to_string(),
                    project.workspace_id.as_str(),
                    project.name.as_str(),
                    project.description.as_deref(),
                    format_datetime(&project.created_at),
                    project.created_by.as_str(),
                    format_datetime(&project.last_updated_at),
                    project.last_updated_by.as_str()
                ],
            )
            .await?;
        if rows.next().await?.is_none() {
            return Err(DatabaseError::AlreadyExists {
                entity: "project".to_string(),
                key: format!("{}/{}", project.workspace_id, project.name),
            });
        }
        Ok(())
    }

    pub async fn get_project(
        &self,
        id: Uuid,
        workspace_id: &str,
    ) -> Result<Option<Project>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1 AND workspace_id = ?2"),
                libsql::params![id.to_string(), workspace_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    /// Projects in `workspace_id` whose name is one of `names`, ordered by name.
    pub async fn find_projects_by_names(
        &self,
        workspace_id: &str,
        names: &[String],
    ) -> Result<Vec<Project>, DatabaseError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (2..=names.len() + 1)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut params: Vec<libsql::Value> = Vec::with_capacity(names.len() + 1);
        params.push(workspace_id.to_string().into());
        params.extend(names.iter().map(|n| libsql::Value::from(n.clone())));

        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM projects
                     WHERE workspace_id = ?1 AND name IN ({placeholders})
                     ORDER BY name"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }
}
