//! Project persistent store

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::access::{self, Actor};
use crate::db::Database;
use crate::status::{insert_status, list_statuses, NewStatus};
use crate::task::list_task_views;
use crate::validate::{color_or, normalize_color, required_text};
use crate::{Error, Result};

use super::model::{
    Board, CreateProjectRequest, Project, ProjectSummary, StatusTemplate, UpdateProjectRequest,
    DEFAULT_PROJECT_COLOR,
};

pub(crate) const PROJECT_COLUMNS: &str = "p.id, p.name, p.description, p.color, p.owner_id, \
     p.archived, p.is_public, p.share_token, p.created_at, p.updated_at";

pub(crate) fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        owner_id: row.get("owner_id")?,
        archived: row.get("archived")?,
        is_public: row.get("is_public")?,
        share_token: row.get("share_token")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Load a project or fail with `NotFound`
pub(crate) fn load_project(conn: &Connection, id: Uuid) -> Result<Project> {
    conn.query_row(
        &format!("SELECT {} FROM projects p WHERE p.id = ?1", PROJECT_COLUMNS),
        params![id],
        project_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("Project"))
}

fn load_summary(conn: &Connection, id: Uuid, actor: &Actor) -> Result<ProjectSummary> {
    let (project, owner_name) = conn
        .query_row(
            &format!(
                "SELECT {}, u.display_name AS owner_name
                 FROM projects p LEFT JOIN users u ON u.id = p.owner_id
                 WHERE p.id = ?1",
                PROJECT_COLUMNS
            ),
            params![id],
            |row| Ok((project_from_row(row)?, row.get::<_, Option<String>>("owner_name")?)),
        )
        .optional()?
        .ok_or_else(|| Error::not_found("Project"))?;
    Ok(ProjectSummary::for_actor(project, owner_name, actor))
}

/// Project store backed by the board database
#[derive(Clone)]
pub struct ProjectStore {
    db: Database,
}

impl ProjectStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List all non-archived projects, newest first
    pub async fn list(&self, actor: &Actor) -> Result<Vec<ProjectSummary>> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {}, u.display_name AS owner_name
                     FROM projects p LEFT JOIN users u ON u.id = p.owner_id
                     WHERE p.archived = 0
                     ORDER BY p.created_at DESC",
                    PROJECT_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((project_from_row(row)?, row.get::<_, Option<String>>("owner_name")?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(rows
                    .into_iter()
                    .map(|(project, owner_name)| ProjectSummary::for_actor(project, owner_name, &actor))
                    .collect())
            })
            .await
    }

    /// Get a project by ID
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<ProjectSummary> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let project = load_project(conn, id)?;
                access::ensure_view(&project, &actor)?;
                load_summary(conn, id, &actor)
            })
            .await
    }

    /// Create a project and seed its columns
    pub async fn create(&self, actor: &Actor, request: CreateProjectRequest) -> Result<ProjectSummary> {
        if !access::can_create_project(Some(actor)) {
            return Err(Error::Forbidden(
                "Only administrators can create projects".to_string(),
            ));
        }

        let name = required_text(&request.name, "Project name is required")?;
        let color = color_or(request.color.as_deref(), DEFAULT_PROJECT_COLOR)?;
        let templates = request.default_statuses.unwrap_or_else(StatusTemplate::defaults);
        let mut columns = Vec::with_capacity(templates.len());
        for (index, template) in templates.iter().enumerate() {
            columns.push(NewStatus {
                name: required_text(&template.name, "Status name is required")?,
                color: template.color.clone(),
                order_index: index as i64,
                is_default: index == 0,
                is_done: index + 1 == templates.len(),
            });
        }

        let project = Project::new(name, actor.user_id)
            .with_description(request.description.unwrap_or_default().trim())
            .with_color(color);
        let actor = *actor;

        let summary = self
            .db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO projects (id, name, description, color, owner_id, archived,
                                           is_public, share_token, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        project.id,
                        project.name,
                        project.description,
                        project.color,
                        project.owner_id,
                        project.archived,
                        project.is_public,
                        project.share_token,
                        project.created_at,
                        project.updated_at
                    ],
                )?;
                for column in &columns {
                    insert_status(&tx, project.id, column)?;
                }
                let summary = load_summary(&tx, project.id, &actor)?;
                tx.commit()?;
                Ok(summary)
            })
            .await?;

        tracing::info!(project_id = %summary.id, "Created project '{}'", summary.name);
        Ok(summary)
    }

    /// Update a project's settings
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        request: UpdateProjectRequest,
    ) -> Result<ProjectSummary> {
        if request.is_empty() {
            return Err(Error::InvalidInput("No data to update".to_string()));
        }
        let name = request
            .name
            .as_deref()
            .map(|name| required_text(name, "Project name is required"))
            .transpose()?;
        let color = request.color.as_deref().map(normalize_color).transpose()?;
        let actor = *actor;

        self.db
            .with_conn(move |conn| {
                let mut project = load_project(conn, id)?;
                access::ensure_manage(
                    &project,
                    &actor,
                    "Only project owners can edit project settings",
                )?;

                if let Some(name) = name {
                    project.name = name;
                }
                if let Some(description) = request.description {
                    project.description = description.trim().to_string();
                }
                if let Some(color) = color {
                    project.color = color;
                }
                if let Some(archived) = request.archived {
                    project.archived = archived;
                }
                project.updated_at = Utc::now();

                conn.execute(
                    "UPDATE projects
                     SET name = ?1, description = ?2, color = ?3, archived = ?4, updated_at = ?5
                     WHERE id = ?6",
                    params![
                        project.name,
                        project.description,
                        project.color,
                        project.archived,
                        project.updated_at,
                        project.id
                    ],
                )?;
                load_summary(conn, id, &actor)
            })
            .await
    }

    /// Delete a project together with its statuses, tasks and daily entries
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let project = load_project(conn, id)?;
                access::ensure_manage(
                    &project,
                    &actor,
                    "Only the project owner or admin can delete this project",
                )?;
                conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await?;

        tracing::info!(project_id = %id, "Deleted project");
        Ok(())
    }

    /// Load a project with its ordered statuses and tasks
    pub async fn board(&self, actor: &Actor, id: Uuid) -> Result<Board> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let project = load_project(conn, id)?;
                access::ensure_view(&project, &actor)?;

                Ok(Board {
                    project: load_summary(conn, id, &actor)?,
                    statuses: list_statuses(conn, id)?,
                    tasks: list_task_views(conn, id)?,
                })
            })
            .await
    }
}
