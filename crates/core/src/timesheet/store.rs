//! Timesheet persistent store

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::access::Actor;
use crate::db::Database;
use crate::{Error, Result};

use super::model::{
    billable_amount, Contributor, EntryQuery, PublicEntry, PublicReport, SaveEntryRequest,
    TimesheetEntry,
};
use super::range::{resolve_range, ReportFilter};

const ENTRY_COLUMNS: &str = "id, user_id, entry_date, project, tasks, notes, hours, \
     billable_rate, billable_amount, timer_seconds, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TimesheetEntry> {
    Ok(TimesheetEntry {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        entry_date: row.get("entry_date")?,
        project: row.get("project")?,
        tasks: row.get("tasks")?,
        notes: row.get("notes")?,
        hours: row.get("hours")?,
        billable_rate: row.get("billable_rate")?,
        billable_amount: row.get("billable_amount")?,
        timer_seconds: row.get("timer_seconds")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Load an entry owned by `user_id`; other users' entries do not exist
fn load_own_entry(conn: &Connection, id: Uuid, user_id: Uuid) -> Result<TimesheetEntry> {
    conn.query_row(
        &format!(
            "SELECT {} FROM timesheet_entries WHERE id = ?1 AND user_id = ?2",
            ENTRY_COLUMNS
        ),
        params![id, user_id],
        entry_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("Entry"))
}

fn contributors(conn: &Connection) -> Result<Vec<Contributor>> {
    let mut stmt = conn.prepare(
        "SELECT u.display_name, u.email, MAX(t.updated_at), SUM(t.hours), COUNT(t.id)
         FROM users u JOIN timesheet_entries t ON t.user_id = u.id
         GROUP BY u.id
         ORDER BY MAX(t.updated_at) DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Contributor {
                name: row.get(0)?,
                email: row.get(1)?,
                last_activity: row.get(2)?,
                total_hours: row.get(3)?,
                total_entries: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Timesheet store backed by the board database
#[derive(Clone)]
pub struct TimesheetStore {
    db: Database,
}

impl TimesheetStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an entry, or update one of the caller's entries when an id is given
    pub async fn save(&self, actor: &Actor, request: SaveEntryRequest) -> Result<TimesheetEntry> {
        request.validate()?;
        let rate = request.billable_rate.unwrap_or(0.0);
        let user_id = actor.user_id;

        self.db
            .with_conn(move |conn| {
                let now = Utc::now();
                let mut entry = match request.id {
                    Some(id) => load_own_entry(conn, id, user_id)?,
                    None => TimesheetEntry {
                        id: Uuid::new_v4(),
                        user_id,
                        entry_date: request.entry_date,
                        project: String::new(),
                        tasks: String::new(),
                        notes: String::new(),
                        hours: 0.0,
                        billable_rate: 0.0,
                        billable_amount: 0.0,
                        timer_seconds: 0,
                        created_at: now,
                        updated_at: now,
                    },
                };

                entry.entry_date = request.entry_date;
                entry.project = request.project.unwrap_or_default().trim().to_string();
                entry.tasks = request.tasks.unwrap_or_default().trim().to_string();
                entry.notes = request.notes.unwrap_or_default().trim().to_string();
                entry.hours = request.hours;
                entry.billable_rate = rate;
                entry.billable_amount = billable_amount(request.hours, rate);
                if let Some(seconds) = request.timer_seconds {
                    entry.timer_seconds = seconds;
                }
                entry.updated_at = now;

                conn.execute(
                    "INSERT INTO timesheet_entries (id, user_id, entry_date, project, tasks, notes,
                                                    hours, billable_rate, billable_amount,
                                                    timer_seconds, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(id) DO UPDATE SET
                        entry_date = excluded.entry_date,
                        project = excluded.project,
                        tasks = excluded.tasks,
                        notes = excluded.notes,
                        hours = excluded.hours,
                        billable_rate = excluded.billable_rate,
                        billable_amount = excluded.billable_amount,
                        timer_seconds = excluded.timer_seconds,
                        updated_at = excluded.updated_at",
                    params![
                        entry.id,
                        entry.user_id,
                        entry.entry_date,
                        entry.project,
                        entry.tasks,
                        entry.notes,
                        entry.hours,
                        entry.billable_rate,
                        entry.billable_amount,
                        entry.timer_seconds,
                        entry.created_at,
                        entry.updated_at
                    ],
                )?;
                Ok(entry)
            })
            .await
    }

    /// The caller's entries within optional inclusive bounds, newest first
    pub async fn list(&self, actor: &Actor, query: EntryQuery) -> Result<Vec<TimesheetEntry>> {
        let user_id = actor.user_id;
        self.db
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM timesheet_entries
                     WHERE user_id = ?1
                       AND (?2 IS NULL OR entry_date >= ?2)
                       AND (?3 IS NULL OR entry_date <= ?3)
                     ORDER BY entry_date DESC, created_at DESC",
                    ENTRY_COLUMNS
                ))?;
                let entries = stmt
                    .query_map(params![user_id, query.start_date, query.end_date], entry_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(entries)
            })
            .await
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let user_id = actor.user_id;
        let deleted = self
            .db
            .with_conn(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM timesheet_entries WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )?)
            })
            .await?;
        if deleted == 0 {
            return Err(Error::not_found("Entry"));
        }
        Ok(())
    }

    /// Build the anonymous report for a period
    ///
    /// Unknown filter names fall back to the current week.
    pub async fn public_report(
        &self,
        filter: Option<&str>,
        custom_start: Option<NaiveDate>,
        custom_end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<PublicReport> {
        let requested = filter
            .and_then(|name| name.parse::<ReportFilter>().ok())
            .unwrap_or_default();
        let (filter, range) = resolve_range(requested, custom_start, custom_end, today)?;

        let (entries, contributors) = self
            .db
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT entry_date, project, tasks, notes, hours
                     FROM timesheet_entries
                     WHERE entry_date BETWEEN ?1 AND ?2
                     ORDER BY entry_date DESC, created_at DESC",
                )?;
                let entries = stmt
                    .query_map(params![range.start, range.end], |row| {
                        Ok(PublicEntry {
                            entry_date: row.get(0)?,
                            project: row.get(1)?,
                            tasks: row.get(2)?,
                            notes: row.get(3)?,
                            hours: row.get(4)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok((entries, contributors(conn)?))
            })
            .await?;

        tracing::debug!(
            filter = filter.as_str(),
            start = %range.start,
            end = %range.end,
            entries = entries.len(),
            "Built public timesheet report"
        );
        Ok(PublicReport {
            entries,
            contributors,
            filter,
            date_range: range,
        })
    }
}
