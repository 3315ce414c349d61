//! Daily entry endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use pm_core::daily::{CreateDailyEntryRequest, DailyEntry, UpdateDailyEntryRequest};
use serde::Serialize;
use uuid::Uuid;

use super::{
    core_error, current_actor, json_body, message, message_with, Message, MessageWith, RouteError,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct EntriesResponse {
    entries: Vec<DailyEntry>,
}

#[derive(Debug, Serialize)]
struct EntryPayload {
    entry: DailyEntry,
}

async fn list_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<Uuid>,
) -> Result<Json<EntriesResponse>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let entries = state
        .daily_entry_store()
        .list(&actor, task_id)
        .await
        .map_err(core_error)?;
    Ok(Json(EntriesResponse { entries }))
}

async fn create_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<Uuid>,
    payload: Result<Json<CreateDailyEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageWith<EntryPayload>>), RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let entry = state
        .daily_entry_store()
        .create(&actor, task_id, req)
        .await
        .map_err(core_error)?;
    Ok((
        StatusCode::CREATED,
        message_with("Daily task entry created successfully", EntryPayload { entry }),
    ))
}

async fn update_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateDailyEntryRequest>, JsonRejection>,
) -> Result<Json<MessageWith<EntryPayload>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let entry = state
        .daily_entry_store()
        .update(&actor, id, req)
        .await
        .map_err(core_error)?;
    Ok(message_with("Daily task entry updated successfully", EntryPayload { entry }))
}

async fn delete_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    state
        .daily_entry_store()
        .delete(&actor, id)
        .await
        .map_err(core_error)?;
    Ok(message("Daily task entry deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks/{id}/entries", get(list_entries).post(create_entry))
        .route("/api/entries/{id}", put(update_entry).delete(delete_entry))
}
