//! Project model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{self, Actor};
use crate::status::Status;
use crate::task::TaskView;

pub const DEFAULT_PROJECT_COLOR: &str = "#3b82f6";

/// A Project owns a board: an ordered set of statuses holding tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project identifier
    pub id: Uuid,

    /// Human-readable project name
    pub name: String,

    pub description: String,

    /// Hex color used for the project card (e.g. "#3b82f6")
    pub color: String,

    /// User who created the project
    pub owner_id: Uuid,

    /// Archived projects are hidden from the project list
    pub archived: bool,

    /// Whether the share link currently grants public read access
    pub is_public: bool,

    /// Secret for the public share link; kept when sharing is turned off
    pub share_token: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project with required fields
    pub fn new(name: impl Into<String>, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            color: DEFAULT_PROJECT_COLOR.to_string(),
            owner_id,
            archived: false,
            is_public: false,
            share_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Column seeded when a project is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTemplate {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl StatusTemplate {
    fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: Some(color.to_string()),
        }
    }

    /// Columns used when the request does not name any
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("To Do", "#6b7280"),
            Self::new("In Progress", "#f59e0b"),
            Self::new("Done", "#10b981"),
        ]
    }
}

/// Request to create a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub color: Option<String>,

    /// Columns to seed; the first becomes the default column and the last
    /// the done column. `None` seeds To Do / In Progress / Done.
    #[serde(default)]
    pub default_statuses: Option<Vec<StatusTemplate>>,
}

/// Partial project update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub archived: Option<bool>,
}

impl UpdateProjectRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.archived.is_none()
    }
}

/// Project as seen by a particular user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub color: String,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub archived: bool,
    pub is_public: bool,
    /// Only disclosed to users who can manage the project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    pub is_owner: bool,
    pub can_manage: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectSummary {
    pub fn for_actor(project: Project, owner_name: Option<String>, actor: &Actor) -> Self {
        let can_manage = access::can_manage(&project, Some(actor));
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            color: project.color,
            owner_id: project.owner_id,
            owner_name: owner_name.unwrap_or_else(|| "Unknown".to_string()),
            archived: project.archived,
            is_public: project.is_public,
            share_token: if can_manage { project.share_token } else { None },
            is_owner: project.owner_id == actor.user_id,
            can_manage,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// A project's full board
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub project: ProjectSummary,
    pub statuses: Vec<Status>,
    pub tasks: Vec<TaskView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserRole;

    #[test]
    fn test_create_project() {
        let owner = Uuid::new_v4();
        let project = Project::new("Website", owner);

        assert_eq!(project.name, "Website");
        assert_eq!(project.owner_id, owner);
        assert_eq!(project.color, DEFAULT_PROJECT_COLOR);
        assert!(!project.archived);
        assert!(!project.is_public);
        assert!(project.share_token.is_none());
    }

    #[test]
    fn test_project_with_builders() {
        let project = Project::new("Website", Uuid::new_v4())
            .with_description("Relaunch")
            .with_color("#10b981");

        assert_eq!(project.description, "Relaunch");
        assert_eq!(project.color, "#10b981");
    }

    #[test]
    fn test_summary_hides_share_token_from_members() {
        let owner = Actor::new(Uuid::new_v4(), UserRole::Member);
        let member = Actor::new(Uuid::new_v4(), UserRole::Member);
        let mut project = Project::new("Website", owner.user_id);
        project.share_token = Some("abc".to_string());

        let as_owner = ProjectSummary::for_actor(project.clone(), Some("Owner".to_string()), &owner);
        assert!(as_owner.is_owner);
        assert!(as_owner.can_manage);
        assert_eq!(as_owner.share_token.as_deref(), Some("abc"));

        let as_member = ProjectSummary::for_actor(project, None, &member);
        assert!(!as_member.is_owner);
        assert!(!as_member.can_manage);
        assert!(as_member.share_token.is_none());
        assert_eq!(as_member.owner_name, "Unknown");
    }

    #[test]
    fn test_empty_update_request() {
        assert!(UpdateProjectRequest::default().is_empty());
        let update = UpdateProjectRequest {
            archived: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
