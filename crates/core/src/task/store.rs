//! Task persistent store

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use uuid::Uuid;

use crate::access::{self, Actor};
use crate::db::Database;
use crate::ordering::OrderedCollection;
use crate::project::load_project;
use crate::status::{load_status, Status};
use crate::validate::required_text;
use crate::{Error, Result};

use super::model::{
    CreateTaskRequest, MoveTaskRequest, Task, TaskView, UpdateTaskRequest,
};

const TASK_COLUMNS: &str = "t.id, t.project_id, t.status_id, t.title, t.description, \
     t.priority, t.due_date, t.assignee_id, t.creator_id, t.order_index, \
     t.created_at, t.updated_at, t.completed_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        status_id: row.get("status_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority: row.get("priority")?,
        due_date: row.get("due_date")?,
        assignee_id: row.get("assignee_id")?,
        creator_id: row.get("creator_id")?,
        order_index: row.get("order_index")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        completed_at: row.get("completed_at")?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<TaskView> {
    Ok(TaskView {
        task: task_from_row(row)?,
        assignee_name: row.get("assignee_name")?,
        creator_name: row.get("creator_name")?,
    })
}

fn query_views(conn: &Connection, filter: &str, param: &dyn ToSql) -> Result<Vec<TaskView>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, a.display_name AS assignee_name, c.display_name AS creator_name
         FROM tasks t
         JOIN statuses s ON s.id = t.status_id
         LEFT JOIN users a ON a.id = t.assignee_id
         LEFT JOIN users c ON c.id = t.creator_id
         WHERE {}
         ORDER BY s.order_index ASC, t.order_index ASC, t.created_at ASC",
        TASK_COLUMNS, filter
    ))?;
    let views = stmt
        .query_map(&[param], view_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(views)
}

/// Tasks of a project ordered by column, then position
pub(crate) fn list_task_views(conn: &Connection, project_id: Uuid) -> Result<Vec<TaskView>> {
    query_views(conn, "t.project_id = ?1", &project_id)
}

fn load_view(conn: &Connection, id: Uuid) -> Result<TaskView> {
    query_views(conn, "t.id = ?1", &id)?
        .pop()
        .ok_or_else(|| Error::not_found("Task"))
}

pub(crate) fn load_task(conn: &Connection, id: Uuid) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS),
        params![id],
        task_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("Task"))
}

/// Task ids of a status in position order
pub(crate) fn list_task_ids(conn: &Connection, status_id: Uuid) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM tasks WHERE status_id = ?1 ORDER BY order_index ASC, created_at ASC",
    )?;
    let ids = stmt
        .query_map(params![status_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<Uuid>>>()?;
    Ok(ids)
}

/// Place every task of `order` in `status_id` at its position
pub(crate) fn write_task_order(
    conn: &Connection,
    status_id: Uuid,
    order: &OrderedCollection<Uuid>,
) -> Result<()> {
    let mut stmt =
        conn.prepare("UPDATE tasks SET status_id = ?1, order_index = ?2 WHERE id = ?3")?;
    for (id, index) in order.positions() {
        stmt.execute(params![status_id, index, id])?;
    }
    Ok(())
}

fn reindex_status(conn: &Connection, status_id: Uuid) -> Result<()> {
    let order = OrderedCollection::new(list_task_ids(conn, status_id)?);
    write_task_order(conn, status_id, &order)
}

/// Stamp or clear completion for every task in a status
///
/// Tasks already completed keep their original timestamp.
pub(crate) fn sync_completion(conn: &Connection, status_id: Uuid, is_done: bool) -> Result<()> {
    if is_done {
        conn.execute(
            "UPDATE tasks SET completed_at = COALESCE(completed_at, ?1) WHERE status_id = ?2",
            params![Utc::now(), status_id],
        )?;
    } else {
        conn.execute(
            "UPDATE tasks SET completed_at = NULL WHERE status_id = ?1",
            params![status_id],
        )?;
    }
    Ok(())
}

/// Load a status that must belong to `project_id`
fn status_in_project(conn: &Connection, status_id: Uuid, project_id: Uuid) -> Result<Status> {
    match load_status(conn, status_id) {
        Ok(status) if status.project_id == project_id => Ok(status),
        Ok(_) | Err(Error::NotFound(_)) => Err(Error::InvalidInput("Invalid status".to_string())),
        Err(err) => Err(err),
    }
}

fn ensure_user_exists(conn: &Connection, user_id: Uuid) -> Result<()> {
    let exists = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", params![user_id], |_| Ok(()))
        .optional()?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(Error::InvalidInput("Unknown assignee".to_string()))
    }
}

/// Task store backed by the board database
#[derive(Clone)]
pub struct TaskStore {
    db: Database,
}

impl TaskStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List a project's tasks ordered by column, then position
    pub async fn list(&self, actor: &Actor, project_id: Uuid) -> Result<Vec<TaskView>> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let project = load_project(conn, project_id)?;
                access::ensure_view(&project, &actor)?;
                list_task_views(conn, project_id)
            })
            .await
    }

    /// Get a task by ID
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<TaskView> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let task = load_task(conn, id)?;
                let project = load_project(conn, task.project_id)?;
                access::ensure_view(&project, &actor)?;
                load_view(conn, id)
            })
            .await
    }

    /// Create a task at the end of its status
    pub async fn create(
        &self,
        actor: &Actor,
        project_id: Uuid,
        request: CreateTaskRequest,
    ) -> Result<TaskView> {
        let title = required_text(&request.title, "Task title is required")?;
        let actor = *actor;

        let view = self
            .db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let project = load_project(&tx, project_id)?;
                access::ensure_view(&project, &actor)?;
                let status = status_in_project(&tx, request.status_id, project_id)?;
                if let Some(assignee) = request.assignee_id {
                    ensure_user_exists(&tx, assignee)?;
                }

                let mut task = Task::new(title, project_id, status.id, actor.user_id)
                    .with_description(request.description.unwrap_or_default().trim())
                    .with_priority(request.priority.unwrap_or_default())
                    .with_due_date(request.due_date)
                    .with_assignee(request.assignee_id);
                task.order_index = list_task_ids(&tx, status.id)?.len() as i64;
                if status.is_done {
                    task.completed_at = Some(task.created_at);
                }

                tx.execute(
                    "INSERT INTO tasks (id, project_id, status_id, title, description, priority,
                                        due_date, assignee_id, creator_id, order_index,
                                        created_at, updated_at, completed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        task.id,
                        task.project_id,
                        task.status_id,
                        task.title,
                        task.description,
                        task.priority,
                        task.due_date,
                        task.assignee_id,
                        task.creator_id,
                        task.order_index,
                        task.created_at,
                        task.updated_at,
                        task.completed_at
                    ],
                )?;
                let view = load_view(&tx, task.id)?;
                tx.commit()?;
                Ok(view)
            })
            .await?;

        tracing::info!(task_id = %view.task.id, project_id = %project_id, "Created task");
        Ok(view)
    }

    /// Update a task's fields
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        request: UpdateTaskRequest,
    ) -> Result<TaskView> {
        if request.is_empty() {
            return Err(Error::InvalidInput("No data to update".to_string()));
        }
        let title = request
            .title
            .as_deref()
            .map(|title| required_text(title, "Task title is required"))
            .transpose()?;
        let actor = *actor;

        self.db
            .with_conn(move |conn| {
                let mut task = load_task(conn, id)?;
                let project = load_project(conn, task.project_id)?;
                access::ensure_view(&project, &actor)?;

                if let Some(title) = title {
                    task.title = title;
                }
                if let Some(description) = request.description {
                    task.description = description.trim().to_string();
                }
                if let Some(priority) = request.priority {
                    task.priority = priority;
                }
                if let Some(due_date) = request.due_date {
                    task.due_date = due_date;
                }
                if let Some(assignee) = request.assignee_id {
                    if let Some(user_id) = assignee {
                        ensure_user_exists(conn, user_id)?;
                    }
                    task.assignee_id = assignee;
                }
                task.updated_at = Utc::now();

                conn.execute(
                    "UPDATE tasks
                     SET title = ?1, description = ?2, priority = ?3, due_date = ?4,
                         assignee_id = ?5, updated_at = ?6
                     WHERE id = ?7",
                    params![
                        task.title,
                        task.description,
                        task.priority,
                        task.due_date,
                        task.assignee_id,
                        task.updated_at,
                        task.id
                    ],
                )?;
                load_view(conn, id)
            })
            .await
    }

    /// Delete a task and its daily entries
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let task = load_task(&tx, id)?;
                let project = load_project(&tx, task.project_id)?;
                access::ensure_view(&project, &actor)?;

                tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
                reindex_status(&tx, task.status_id)?;
                tx.commit()?;
                Ok(())
            })
            .await?;

        tracing::info!(task_id = %id, "Deleted task");
        Ok(())
    }

    /// Move a task to a status and position
    ///
    /// Completion follows the target column's done flag.
    pub async fn move_task(
        &self,
        actor: &Actor,
        id: Uuid,
        request: MoveTaskRequest,
    ) -> Result<TaskView> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let task = load_task(&tx, id)?;
                let project = load_project(&tx, task.project_id)?;
                access::ensure_view(&project, &actor)?;
                let target = status_in_project(&tx, request.status_id, task.project_id)?;

                let mut order = OrderedCollection::new(list_task_ids(&tx, target.id)?);
                let index = order.insert_at(task.id, request.index.unwrap_or(usize::MAX));
                write_task_order(&tx, target.id, &order)?;
                if task.status_id != target.id {
                    reindex_status(&tx, task.status_id)?;
                }

                let completed_at = if target.is_done {
                    task.completed_at.or_else(|| Some(Utc::now()))
                } else {
                    None
                };
                tx.execute(
                    "UPDATE tasks SET completed_at = ?1, updated_at = ?2 WHERE id = ?3",
                    params![completed_at, Utc::now(), id],
                )?;

                let view = load_view(&tx, id)?;
                tx.commit()?;
                tracing::debug!(task_id = %id, status_id = %target.id, index, "Moved task");
                Ok(view)
            })
            .await
    }

    /// Reorder the tasks of a status
    ///
    /// Listed tasks from other columns of the same project are pulled into
    /// this one; tasks of other projects reject the whole batch.
    pub async fn reorder(
        &self,
        actor: &Actor,
        status_id: Uuid,
        ordered_ids: Vec<Uuid>,
    ) -> Result<Vec<TaskView>> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let status = load_status(&tx, status_id)?;
                let project = load_project(&tx, status.project_id)?;
                access::ensure_view(&project, &actor)?;

                let mut former_statuses = Vec::new();
                for id in &ordered_ids {
                    let owner: Option<(Uuid, Uuid)> = tx
                        .query_row(
                            "SELECT project_id, status_id FROM tasks WHERE id = ?1",
                            params![id],
                            |row| Ok((row.get(0)?, row.get(1)?)),
                        )
                        .optional()?;
                    match owner {
                        Some((project_id, former)) if project_id == status.project_id => {
                            if former != status_id && !former_statuses.contains(&former) {
                                former_statuses.push(former);
                            }
                        }
                        _ => {
                            return Err(Error::InvalidInput(format!(
                                "Task {} does not belong to this project",
                                id
                            )))
                        }
                    }
                }

                let mut order = OrderedCollection::new(list_task_ids(&tx, status_id)?);
                order.reorder(&ordered_ids);
                write_task_order(&tx, status_id, &order)?;
                for former in &former_statuses {
                    reindex_status(&tx, *former)?;
                }
                sync_completion(&tx, status_id, status.is_done)?;

                let views = query_views(&tx, "t.status_id = ?1", &status_id)?;
                tx.commit()?;
                tracing::debug!(
                    status_id = %status_id,
                    count = views.len(),
                    pulled_from = former_statuses.len(),
                    "Reordered tasks"
                );
                Ok(views)
            })
            .await
    }
}
