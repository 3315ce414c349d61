//! Timesheet endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    routing::{delete, get},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use pm_core::timesheet::{EntryQuery, PublicReport, SaveEntryRequest, TimesheetEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    core_error, current_actor, json_body, message, message_with, query_params, Message,
    MessageWith, RouteError,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct EntriesResponse {
    entries: Vec<TimesheetEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedEntry {
    entry_id: Uuid,
    entry: TimesheetEntry,
}

/// Report parameters are taken leniently: unparseable dates count as absent
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportQuery {
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

fn lenient_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
}

async fn list_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<EntryQuery>, QueryRejection>,
) -> Result<Json<EntriesResponse>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let query = query_params(query)?;
    let entries = state
        .timesheet_store()
        .list(&actor, query)
        .await
        .map_err(core_error)?;
    Ok(Json(EntriesResponse { entries }))
}

async fn save_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SaveEntryRequest>, JsonRejection>,
) -> Result<Json<MessageWith<SavedEntry>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let text = if req.id.is_some() {
        "Entry updated successfully"
    } else {
        "Entry saved successfully"
    };
    let entry = state
        .timesheet_store()
        .save(&actor, req)
        .await
        .map_err(core_error)?;
    Ok(message_with(
        text,
        SavedEntry {
            entry_id: entry.id,
            entry,
        },
    ))
}

async fn delete_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    state
        .timesheet_store()
        .delete(&actor, id)
        .await
        .map_err(core_error)?;
    Ok(message("Entry deleted successfully"))
}

async fn public_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<PublicReport>, RouteError> {
    let query = query_params(query)?;
    let report = state
        .timesheet_store()
        .public_report(
            query.filter.as_deref(),
            lenient_date(query.start_date.as_deref()),
            lenient_date(query.end_date.as_deref()),
            Utc::now().date_naive(),
        )
        .await
        .map_err(core_error)?;
    Ok(Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/timesheet/entries", get(list_entries).post(save_entry))
        .route("/api/timesheet/entries/{id}", delete(delete_entry))
        .route("/api/public/timesheet", get(public_report))
}
