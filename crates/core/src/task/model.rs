//! Task model definitions

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::Error;

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(Error::InvalidInput(format!("Unsupported priority '{}'", value))),
        }
    }
}

impl ToSql for TaskPriority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TaskPriority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err: Error| FromSqlError::Other(Box::new(err)))
    }
}

/// A card on a project's board
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    /// Position within the status, `0..n-1`
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set while the task sits in a done column
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task in a status
    pub fn new(title: impl Into<String>, project_id: Uuid, status_id: Uuid, creator_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            status_id,
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::default(),
            due_date: None,
            assignee_id: None,
            creator_id,
            order_index: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Set the assignee
    pub fn with_assignee(mut self, assignee_id: Option<Uuid>) -> Self {
        self.assignee_id = assignee_id;
        self
    }
}

/// Task joined with the display names of the people on it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assignee_name: Option<String>,
    pub creator_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub status_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
}

/// Partial task update
///
/// `dueDate` and `assigneeId` distinguish "absent" (leave as is) from an
/// explicit `null` (clear).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assignee_id.is_none()
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Move a task to a status and position
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskRequest {
    pub status_id: Uuid,
    /// Target position; absent or past the end appends
    #[serde(default)]
    pub index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task() {
        let creator = Uuid::new_v4();
        let task = Task::new("Write copy", Uuid::new_v4(), Uuid::new_v4(), creator);

        assert_eq!(task.title, "Write copy");
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.creator_id, creator);
        assert!(task.assignee_id.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_task_builders() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let assignee = Uuid::new_v4();
        let task = Task::new("Write copy", Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .with_description("Landing page")
            .with_priority(TaskPriority::Urgent)
            .with_due_date(Some(due))
            .with_assignee(Some(assignee));

        assert_eq!(task.description, "Landing page");
        assert_eq!(task.priority, TaskPriority::Urgent);
        assert_eq!(task.due_date, Some(due));
        assert_eq!(task.assignee_id, Some(assignee));
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!("urgent".parse::<TaskPriority>().unwrap(), TaskPriority::Urgent);
        assert_eq!(" High ".parse::<TaskPriority>().unwrap(), TaskPriority::High);
        assert!("critical".parse::<TaskPriority>().is_err());

        let json = serde_json::to_string(&TaskPriority::Low).unwrap();
        assert_eq!(json, "\"Low\"");
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title":"New"}"#).unwrap();
        assert!(absent.due_date.is_none());
        assert!(absent.assignee_id.is_none());

        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"dueDate":null,"assigneeId":null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));
        assert_eq!(cleared.assignee_id, Some(None));
        assert!(!cleared.is_empty());

        let set: UpdateTaskRequest = serde_json::from_str(r#"{"dueDate":"2026-03-01"}"#).unwrap();
        assert_eq!(set.due_date, Some(NaiveDate::from_ymd_opt(2026, 3, 1)));
    }

    #[test]
    fn test_view_flattens_task() {
        let view = TaskView {
            task: Task::new("Write copy", Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()),
            assignee_name: None,
            creator_name: Some("Dev".to_string()),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["title"], "Write copy");
        assert_eq!(json["creatorName"], "Dev");
        assert_eq!(json["priority"], "Medium");
    }
}
