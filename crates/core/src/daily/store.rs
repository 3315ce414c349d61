//! Daily entry persistent store

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::access::{self, Actor};
use crate::db::Database;
use crate::project::load_project;
use crate::task::load_task;
use crate::{Error, Result};

use super::model::{
    ensure_time_order, parse_time_of_day, CreateDailyEntryRequest, DailyEntry,
    UpdateDailyEntryRequest,
};

const ENTRY_COLUMNS: &str =
    "id, task_id, description, end_of_day_report, start_time, end_time, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<DailyEntry> {
    Ok(DailyEntry {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        description: row.get("description")?,
        end_of_day_report: row.get("end_of_day_report")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_entry(conn: &Connection, id: Uuid) -> Result<DailyEntry> {
    conn.query_row(
        &format!("SELECT {} FROM daily_task_entries WHERE id = ?1", ENTRY_COLUMNS),
        params![id],
        entry_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("Entry"))
}

/// Entries inherit visibility from the project of their task
fn ensure_task_visible(conn: &Connection, task_id: Uuid, actor: &Actor) -> Result<()> {
    let task = load_task(conn, task_id)?;
    let project = load_project(conn, task.project_id)?;
    access::ensure_view(&project, actor)
}

/// Daily entry store backed by the board database
#[derive(Clone)]
pub struct DailyEntryStore {
    db: Database,
}

impl DailyEntryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List a task's entries by start time
    pub async fn list(&self, actor: &Actor, task_id: Uuid) -> Result<Vec<DailyEntry>> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                ensure_task_visible(conn, task_id, &actor)?;
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM daily_task_entries WHERE task_id = ?1
                     ORDER BY start_time ASC, created_at ASC",
                    ENTRY_COLUMNS
                ))?;
                let entries = stmt
                    .query_map(params![task_id], entry_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(entries)
            })
            .await
    }

    pub async fn create(
        &self,
        actor: &Actor,
        task_id: Uuid,
        request: CreateDailyEntryRequest,
    ) -> Result<DailyEntry> {
        let start_time = match request.start_time.as_deref() {
            Some(value) => parse_time_of_day(value)?,
            None => None,
        };
        let end_time = match request.end_time.as_deref() {
            Some(value) => parse_time_of_day(value)?,
            None => None,
        };
        ensure_time_order(start_time, end_time)?;

        let now = Utc::now();
        let entry = DailyEntry {
            id: Uuid::new_v4(),
            task_id,
            description: request.description.unwrap_or_default().trim().to_string(),
            end_of_day_report: request.end_of_day_report.unwrap_or_default().trim().to_string(),
            start_time,
            end_time,
            created_at: now,
            updated_at: now,
        };
        let actor = *actor;

        self.db
            .with_conn(move |conn| {
                ensure_task_visible(conn, task_id, &actor)?;
                conn.execute(
                    "INSERT INTO daily_task_entries (id, task_id, description, end_of_day_report,
                                                     start_time, end_time, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        entry.id,
                        entry.task_id,
                        entry.description,
                        entry.end_of_day_report,
                        entry.start_time,
                        entry.end_time,
                        entry.created_at,
                        entry.updated_at
                    ],
                )?;
                Ok(entry)
            })
            .await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        request: UpdateDailyEntryRequest,
    ) -> Result<DailyEntry> {
        if request.is_empty() {
            return Err(Error::InvalidInput("No data to update".to_string()));
        }
        let start_time = request.start_time.as_deref().map(parse_time_of_day).transpose()?;
        let end_time = request.end_time.as_deref().map(parse_time_of_day).transpose()?;
        let actor = *actor;

        self.db
            .with_conn(move |conn| {
                let mut entry = load_entry(conn, id)?;
                ensure_task_visible(conn, entry.task_id, &actor)?;

                if let Some(description) = request.description {
                    entry.description = description.trim().to_string();
                }
                if let Some(report) = request.end_of_day_report {
                    entry.end_of_day_report = report.trim().to_string();
                }
                if let Some(start_time) = start_time {
                    entry.start_time = start_time;
                }
                if let Some(end_time) = end_time {
                    entry.end_time = end_time;
                }
                ensure_time_order(entry.start_time, entry.end_time)?;
                entry.updated_at = Utc::now();

                conn.execute(
                    "UPDATE daily_task_entries
                     SET description = ?1, end_of_day_report = ?2, start_time = ?3,
                         end_time = ?4, updated_at = ?5
                     WHERE id = ?6",
                    params![
                        entry.description,
                        entry.end_of_day_report,
                        entry.start_time,
                        entry.end_time,
                        entry.updated_at,
                        entry.id
                    ],
                )?;
                Ok(entry)
            })
            .await
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let actor = *actor;
        self.db
            .with_conn(move |conn| {
                let entry = load_entry(conn, id)?;
                ensure_task_visible(conn, entry.task_id, &actor)?;
                conn.execute("DELETE FROM daily_task_entries WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await
    }
}
