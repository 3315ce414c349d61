//! Public share links
//!
//! A project can be published read-only through a random token. Turning
//! sharing off keeps the token so the same link works again once re-enabled;
//! regenerating replaces it and the old link stops resolving immediately.

use chrono::{DateTime, NaiveDate, Utc};
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::access::{self, Actor};
use crate::db::Database;
use crate::project::{load_project, project_from_row, Project, PROJECT_COLUMNS};
use crate::status::list_statuses;
use crate::task::{list_task_views, TaskPriority};
use crate::{Error, Result};

const TOKEN_BYTES: usize = 16;
const MANAGE_DENIED: &str = "Only project owners and admins can change sharing";

/// Generate a fresh share token: 16 random bytes as 32 lowercase hex chars
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Sharing state of a project as reported to its managers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareState {
    pub is_public: bool,
    pub share_token: Option<String>,
    /// Only present while the link resolves
    pub share_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProject {
    pub name: String,
    pub description: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStatus {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub order_index: i64,
    pub is_done: bool,
}

/// Task without assignee or creator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTask {
    pub id: Uuid,
    pub status_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub order_index: i64,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Read-only board served through a share link
#[derive(Debug, Clone, Serialize)]
pub struct PublicBoard {
    pub project: PublicProject,
    pub statuses: Vec<PublicStatus>,
    pub tasks: Vec<PublicTask>,
}

fn write_share(conn: &Connection, project: &Project) -> Result<()> {
    conn.execute(
        "UPDATE projects SET is_public = ?1, share_token = ?2, updated_at = ?3 WHERE id = ?4",
        params![project.is_public, project.share_token, Utc::now(), project.id],
    )?;
    Ok(())
}

/// Issues, rotates and resolves share tokens
#[derive(Clone)]
pub struct ShareTokenIssuer {
    db: Database,
    public_base_url: String,
}

impl ShareTokenIssuer {
    pub fn new(db: Database, public_base_url: impl Into<String>) -> Self {
        Self {
            db,
            public_base_url: public_base_url.into(),
        }
    }

    /// Link to the public board for `token`
    pub fn share_url(&self, token: &str) -> String {
        let separator = if self.public_base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}pm_share={}",
            self.public_base_url,
            separator,
            urlencoding::encode(token)
        )
    }

    fn state_of(&self, project: &Project) -> ShareState {
        ShareState {
            is_public: project.is_public,
            share_token: project.share_token.clone(),
            share_url: project
                .share_token
                .as_deref()
                .filter(|_| project.is_public)
                .map(|token| self.share_url(token)),
        }
    }

    /// Current sharing state
    pub async fn state(&self, actor: &Actor, project_id: Uuid) -> Result<ShareState> {
        let actor = *actor;
        let project = self
            .db
            .with_conn(move |conn| {
                let project = load_project(conn, project_id)?;
                access::ensure_manage(&project, &actor, MANAGE_DENIED)?;
                Ok(project)
            })
            .await?;
        Ok(self.state_of(&project))
    }

    /// Publish the board, issuing a token on first use
    pub async fn enable(&self, actor: &Actor, project_id: Uuid) -> Result<ShareState> {
        self.set_public(actor, project_id, true).await
    }

    /// Stop serving the board; the token is kept for re-enabling
    pub async fn disable(&self, actor: &Actor, project_id: Uuid) -> Result<ShareState> {
        self.set_public(actor, project_id, false).await
    }

    pub async fn set_public(
        &self,
        actor: &Actor,
        project_id: Uuid,
        is_public: bool,
    ) -> Result<ShareState> {
        let actor = *actor;
        let project = self
            .db
            .with_conn(move |conn| {
                let mut project = load_project(conn, project_id)?;
                access::ensure_manage(&project, &actor, MANAGE_DENIED)?;

                if project.is_public == is_public
                    && (project.share_token.is_some() || !is_public)
                {
                    return Ok(project);
                }
                project.is_public = is_public;
                if is_public && project.share_token.is_none() {
                    project.share_token = Some(generate_token());
                }
                write_share(conn, &project)?;
                Ok(project)
            })
            .await?;

        tracing::info!(project_id = %project_id, is_public, "Updated project sharing");
        Ok(self.state_of(&project))
    }

    /// Replace the token; links built from the old one stop resolving
    pub async fn regenerate(&self, actor: &Actor, project_id: Uuid) -> Result<ShareState> {
        let actor = *actor;
        let project = self
            .db
            .with_conn(move |conn| {
                let mut project = load_project(conn, project_id)?;
                access::ensure_manage(&project, &actor, MANAGE_DENIED)?;

                let previous = project.share_token.take();
                let mut token = generate_token();
                while previous.as_deref() == Some(token.as_str()) {
                    token = generate_token();
                }
                project.share_token = Some(token);
                write_share(conn, &project)?;
                Ok(project)
            })
            .await?;

        tracing::info!(project_id = %project_id, "Regenerated share token");
        Ok(self.state_of(&project))
    }

    /// Public board for a token, if a shared project carries it
    pub async fn resolve(&self, token: &str) -> Result<PublicBoard> {
        let token = token.trim().to_lowercase();
        if !is_well_formed(&token) {
            return Err(Error::not_found("Board"));
        }

        self.db
            .with_conn(move |conn| {
                let project = conn
                    .query_row(
                        &format!(
                            "SELECT {} FROM projects p
                             WHERE p.share_token = ?1 AND p.is_public = 1 AND p.archived = 0",
                            PROJECT_COLUMNS
                        ),
                        params![token],
                        project_from_row,
                    )
                    .optional()?
                    .ok_or_else(|| Error::not_found("Board"))?;

                let statuses = list_statuses(conn, project.id)?
                    .into_iter()
                    .map(|status| PublicStatus {
                        id: status.id,
                        name: status.name,
                        color: status.color,
                        order_index: status.order_index,
                        is_done: status.is_done,
                    })
                    .collect();
                let tasks = list_task_views(conn, project.id)?
                    .into_iter()
                    .map(|view| PublicTask {
                        id: view.task.id,
                        status_id: view.task.status_id,
                        title: view.task.title,
                        description: view.task.description,
                        priority: view.task.priority,
                        due_date: view.task.due_date,
                        order_index: view.task.order_index,
                        completed_at: view.task.completed_at,
                    })
                    .collect();

                Ok(PublicBoard {
                    project: PublicProject {
                        name: project.name,
                        description: project.description,
                        color: project.color,
                    },
                    statuses,
                    tasks,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{CreateProjectRequest, ProjectStore};
    use crate::task::{CreateTaskRequest, TaskStore};
    use crate::user::UserStore;

    struct Fixture {
        issuer: ShareTokenIssuer,
        admin: Actor,
        member: Actor,
        project_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let users = UserStore::new(db.clone());
        let admin = Actor::from(&users.register("admin@example.com", "password-1", "Admin").await.unwrap());
        let member = Actor::from(&users.register("dev@example.com", "password-1", "Dev").await.unwrap());

        let projects = ProjectStore::new(db.clone());
        let project = projects
            .create(
                &admin,
                CreateProjectRequest {
                    name: "Website".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let status_id = projects.board(&admin, project.id).await.unwrap().statuses[0].id;
        TaskStore::new(db.clone())
            .create(
                &member,
                project.id,
                CreateTaskRequest {
                    status_id,
                    title: "Landing page".to_string(),
                    assignee_id: Some(member.user_id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        Fixture {
            issuer: ShareTokenIssuer::new(db, "https://example.com/board"),
            admin,
            member,
            project_id: project.id,
        }
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(is_well_formed(&token));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_share_url_separator() {
        let db = Database::open_in_memory().unwrap();
        let plain = ShareTokenIssuer::new(db.clone(), "https://example.com/board");
        assert_eq!(plain.share_url("abc"), "https://example.com/board?pm_share=abc");

        let with_query = ShareTokenIssuer::new(db, "https://example.com/?page_id=7");
        assert_eq!(
            with_query.share_url("abc"),
            "https://example.com/?page_id=7&pm_share=abc"
        );
    }

    #[tokio::test]
    async fn test_enable_is_idempotent() {
        let fx = fixture().await;
        let first = fx.issuer.enable(&fx.admin, fx.project_id).await.unwrap();
        assert!(first.is_public);
        let token = first.share_token.clone().unwrap();
        assert_eq!(
            first.share_url.as_deref(),
            Some(format!("https://example.com/board?pm_share={}", token).as_str())
        );

        let second = fx.issuer.enable(&fx.admin, fx.project_id).await.unwrap();
        assert_eq!(second.share_token, Some(token));
    }

    #[tokio::test]
    async fn test_disable_keeps_token_but_stops_resolving() {
        let fx = fixture().await;
        let token = fx.issuer.enable(&fx.admin, fx.project_id).await.unwrap().share_token.unwrap();
        assert!(fx.issuer.resolve(&token).await.is_ok());

        let state = fx.issuer.disable(&fx.admin, fx.project_id).await.unwrap();
        assert!(!state.is_public);
        assert_eq!(state.share_token.as_deref(), Some(token.as_str()));
        assert!(state.share_url.is_none());
        assert!(matches!(fx.issuer.resolve(&token).await, Err(Error::NotFound(_))));

        let again = fx.issuer.enable(&fx.admin, fx.project_id).await.unwrap();
        assert_eq!(again.share_token, Some(token));
    }

    #[tokio::test]
    async fn test_regenerate_invalidates_old_token() {
        let fx = fixture().await;
        let old = fx.issuer.enable(&fx.admin, fx.project_id).await.unwrap().share_token.unwrap();

        let state = fx.issuer.regenerate(&fx.admin, fx.project_id).await.unwrap();
        let new = state.share_token.unwrap();
        assert_ne!(old, new);
        assert!(matches!(fx.issuer.resolve(&old).await, Err(Error::NotFound(_))));
        assert!(fx.issuer.resolve(&new).await.is_ok());
    }

    #[tokio::test]
    async fn test_members_cannot_change_sharing() {
        let fx = fixture().await;
        let err = fx.issuer.enable(&fx.member, fx.project_id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
        let err = fx.issuer.regenerate(&fx.member, fx.project_id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
        let err = fx.issuer.state(&fx.member, fx.project_id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_public_board_omits_people() {
        let fx = fixture().await;
        let token = fx.issuer.enable(&fx.admin, fx.project_id).await.unwrap().share_token.unwrap();

        let board = fx.issuer.resolve(&token.to_uppercase()).await.unwrap();
        assert_eq!(board.project.name, "Website");
        assert_eq!(board.statuses.len(), 3);
        assert_eq!(board.tasks.len(), 1);

        let json = serde_json::to_value(&board).unwrap();
        assert!(json["tasks"][0].get("assigneeId").is_none());
        assert!(json["tasks"][0].get("creatorName").is_none());
    }

    #[tokio::test]
    async fn test_malformed_token_not_found() {
        let fx = fixture().await;
        assert!(matches!(fx.issuer.resolve("nope").await, Err(Error::NotFound(_))));
    }
}
