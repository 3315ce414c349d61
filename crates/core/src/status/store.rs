//! Status persistent store

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::access::{self, Actor};
use crate::db::Database;
use crate::ordering::OrderedCollection;
use crate::project::load_project;
use crate::task::{list_task_ids, sync_completion, write_task_order};
use crate::validate::{color_or, normalize_color, required_text};
use crate::{Error, Result};

use super::model::{
    CreateStatusRequest, OrphanedTasks, Status, StatusDeletion, UpdateStatusRequest,
    DEFAULT_STATUS_COLOR,
};

const STATUS_COLUMNS: &str =
    "id, project_id, name, color, order_index, is_default, is_done, created_at";
const MANAGE_DENIED: &str = "Only project owners and admins can manage columns";

fn status_from_row(row: &Row<'_>) -> rusqlite::Result<Status> {
    Ok(Status {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        order_index: row.get("order_index")?,
        is_default: row.get("is_default")?,
        is_done: row.get("is_done")?,
        created_at: row.get("created_at")?,
    })
}

/// Column to insert at a known position
pub(crate) struct NewStatus {
    pub name: String,
    pub color: Option<String>,
    pub order_index: i64,
    pub is_default: bool,
    pub is_done: bool,
}

pub(crate) fn insert_status(conn: &Connection, project_id: Uuid, new: &NewStatus) -> Result<Status> {
    let status = Status {
        id: Uuid::new_v4(),
        project_id,
        name: new.name.clone(),
        color: color_or(new.color.as_deref(), DEFAULT_STATUS_COLOR)?,
        order_index: new.order_index,
        is_default: new.is_default,
        is_done: new.is_done,
        created_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO statuses (id, project_id, name, color, order_index, is_default, is_done, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            status.id,
            status.project_id,
            status.name,
            status.color,
            status.order_index,
            status.is_default,
            status.is_done,
            status.created_at
        ],
    )?;
    Ok(status)
}

pub(crate) fn load_status(conn: &Connection, id: Uuid) -> Result<Status> {
    conn.query_row(
        &format!("SELECT {} FROM statuses WHERE id = ?1", STATUS_COLUMNS),
        params![id],
        status_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("Status"))
}

/// Columns of a project in display order
pub(crate) fn list_statuses(conn: &Connection, project_id: Uuid) -> Result<Vec<Status>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM statuses WHERE project_id = ?1 ORDER BY order_index ASC, created_at ASC",
        STATUS_COLUMNS
    ))?;
    let statuses = stmt
        .query_map(params![project_id], status_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(statuses)
}

fn status_order(conn: &Connection, project_id: Uuid) -> Result<OrderedCollection<Uuid>> {
    let ids = list_statuses(conn, project_id)?.into_iter().map(|s| s.id).collect();
    Ok(OrderedCollection::new(ids))
}

fn write_status_order(conn: &Connection, order: &OrderedCollection<Uuid>) -> Result<()> {
    let mut stmt = conn.prepare("UPDATE statuses SET order_index = ?1 WHERE id = ?2")?;
    for (id, index) in order.positions() {
        stmt.execute(params![index, id])?;
    }
    Ok(())
}

/// Status store backed by the board database
#[derive(Clone)]
pub struct StatusStore {
    db: Database,
}

impl StatusStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List a project's columns in display order
    pub async fn list(&self, actor: &Actor, project_id: Uuid) -> Result<Vec<Status>> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let project = load_project(conn, project_id)?;
                access::ensure_view(&project, &actor)?;
                list_statuses(conn, project_id)
            })
            .await
    }

    /// Append a new column to a project's board
    pub async fn create(
        &self,
        actor: &Actor,
        project_id: Uuid,
        request: CreateStatusRequest,
    ) -> Result<Status> {
        let name = required_text(&request.name, "Status name is required")?;
        let actor = *actor;

        self.db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let project = load_project(&tx, project_id)?;
                access::ensure_manage(&project, &actor, MANAGE_DENIED)?;

                let order = status_order(&tx, project_id)?;
                let status = insert_status(
                    &tx,
                    project_id,
                    &NewStatus {
                        name,
                        color: request.color,
                        order_index: order.len() as i64,
                        is_default: order.is_empty(),
                        is_done: request.is_done.unwrap_or(false),
                    },
                )?;
                tx.commit()?;
                Ok(status)
            })
            .await
    }

    /// Rename, recolor or flag a column
    ///
    /// Flipping `is_done` stamps or clears completion on the column's tasks.
    pub async fn update(
        &self,
        actor: &Actor,
        status_id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<Status> {
        if request.is_empty() {
            return Err(Error::InvalidInput("No data to update".to_string()));
        }
        let name = request
            .name
            .as_deref()
            .map(|name| required_text(name, "Status name is required"))
            .transpose()?;
        let color = request.color.as_deref().map(normalize_color).transpose()?;
        let actor = *actor;

        self.db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let mut status = load_status(&tx, status_id)?;
                let project = load_project(&tx, status.project_id)?;
                access::ensure_manage(&project, &actor, MANAGE_DENIED)?;

                if let Some(name) = name {
                    status.name = name;
                }
                if let Some(color) = color {
                    status.color = color;
                }
                let done_changed = request.is_done.is_some_and(|done| done != status.is_done);
                if let Some(is_done) = request.is_done {
                    status.is_done = is_done;
                }

                tx.execute(
                    "UPDATE statuses SET name = ?1, color = ?2, is_done = ?3 WHERE id = ?4",
                    params![status.name, status.color, status.is_done, status.id],
                )?;
                if done_changed {
                    sync_completion(&tx, status.id, status.is_done)?;
                }
                tx.commit()?;
                Ok(status)
            })
            .await
    }

    /// Delete a column, deleting its tasks or moving them to a sibling column
    pub async fn delete(
        &self,
        actor: &Actor,
        status_id: Uuid,
        orphaned: OrphanedTasks,
    ) -> Result<StatusDeletion> {
        let actor = *actor;

        let outcome = self
            .db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let status = load_status(&tx, status_id)?;
                let project = load_project(&tx, status.project_id)?;
                access::ensure_manage(&project, &actor, MANAGE_DENIED)?;

                let orphans = list_task_ids(&tx, status.id)?;
                let outcome = match orphaned {
                    OrphanedTasks::MoveTo(target_id) => {
                        if target_id == status.id {
                            return Err(Error::InvalidInput(
                                "Cannot move tasks into the column being deleted".to_string(),
                            ));
                        }
                        let target = match load_status(&tx, target_id) {
                            Ok(target) if target.project_id == status.project_id => target,
                            Ok(_) | Err(Error::NotFound(_)) => {
                                return Err(Error::InvalidInput(
                                    "Invalid target status".to_string(),
                                ))
                            }
                            Err(err) => return Err(err),
                        };

                        let mut order = OrderedCollection::new(list_task_ids(&tx, target.id)?);
                        for task_id in &orphans {
                            order.push(*task_id);
                        }
                        write_task_order(&tx, target.id, &order)?;
                        sync_completion(&tx, target.id, target.is_done)?;
                        StatusDeletion {
                            moved_tasks: orphans.len(),
                            deleted_tasks: 0,
                        }
                    }
                    OrphanedTasks::Delete => {
                        tx.execute("DELETE FROM tasks WHERE status_id = ?1", params![status.id])?;
                        StatusDeletion {
                            moved_tasks: 0,
                            deleted_tasks: orphans.len(),
                        }
                    }
                };

                tx.execute("DELETE FROM statuses WHERE id = ?1", params![status.id])?;

                let remaining = status_order(&tx, status.project_id)?;
                write_status_order(&tx, &remaining)?;
                if status.is_default {
                    if let Some(first) = remaining.items().first() {
                        tx.execute(
                            "UPDATE statuses SET is_default = 1 WHERE id = ?1",
                            params![first],
                        )?;
                    }
                }
                tx.commit()?;
                Ok(outcome)
            })
            .await?;

        tracing::info!(
            status_id = %status_id,
            moved = outcome.moved_tasks,
            deleted = outcome.deleted_tasks,
            "Deleted status"
        );
        Ok(outcome)
    }

    /// Reorder a project's columns
    ///
    /// Every id must be a column of the project; otherwise nothing changes.
    pub async fn reorder(
        &self,
        actor: &Actor,
        project_id: Uuid,
        ordered_ids: Vec<Uuid>,
    ) -> Result<Vec<Status>> {
        let actor = *actor;

        self.db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let project = load_project(&tx, project_id)?;
                access::ensure_manage(
                    &project,
                    &actor,
                    "Only project owners and admins can reorder columns",
                )?;

                let mut order = status_order(&tx, project_id)?;
                if let Some(stranger) = ordered_ids.iter().find(|id| !order.contains(id)) {
                    return Err(Error::InvalidInput(format!(
                        "Status {} does not belong to this project",
                        stranger
                    )));
                }
                order.reorder(&ordered_ids);
                write_status_order(&tx, &order)?;

                let statuses = list_statuses(&tx, project_id)?;
                tx.commit()?;
                tracing::debug!(project_id = %project_id, count = statuses.len(), "Reordered statuses");
                Ok(statuses)
            })
            .await
    }
}
