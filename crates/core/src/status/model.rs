//! Status model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_STATUS_COLOR: &str = "#6b7280";

/// A column of a project's board
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub color: String,
    /// Position among the project's columns, `0..n-1`
    pub order_index: i64,
    pub is_default: bool,
    /// Tasks in a done column carry a completion timestamp
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStatusRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_done: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_done: Option<bool>,
}

impl UpdateStatusRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.is_done.is_none()
    }
}

/// What happens to the tasks of a deleted column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanedTasks {
    /// Delete them (and their daily entries)
    Delete,
    /// Append them to another column of the same project
    MoveTo(Uuid),
}

impl From<Option<Uuid>> for OrphanedTasks {
    fn from(target: Option<Uuid>) -> Self {
        match target {
            Some(id) => Self::MoveTo(id),
            None => Self::Delete,
        }
    }
}

/// Result of deleting a column
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDeletion {
    pub moved_tasks: usize,
    pub deleted_tasks: usize,
}
