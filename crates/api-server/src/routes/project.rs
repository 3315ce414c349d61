//! Project API endpoints, including share-link management

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use pm_core::project::{Board, CreateProjectRequest, ProjectSummary, UpdateProjectRequest};
use pm_core::share::ShareState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    core_error, current_actor, json_body, message, message_with, Message, MessageWith, RouteError,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ProjectsResponse {
    projects: Vec<ProjectSummary>,
}

#[derive(Debug, Serialize)]
struct ProjectPayload {
    project: ProjectSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareToggleRequest {
    is_public: bool,
}

async fn list_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProjectsResponse>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let projects = state.project_store().list(&actor).await.map_err(core_error)?;
    Ok(Json(ProjectsResponse { projects }))
}

async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageWith<ProjectPayload>>), RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let project = state
        .project_store()
        .create(&actor, req)
        .await
        .map_err(core_error)?;
    Ok((
        StatusCode::CREATED,
        message_with("Project created successfully", ProjectPayload { project }),
    ))
}

async fn get_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectPayload>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let project = state.project_store().get(&actor, id).await.map_err(core_error)?;
    Ok(Json(ProjectPayload { project }))
}

async fn update_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> Result<Json<MessageWith<ProjectPayload>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let project = state
        .project_store()
        .update(&actor, id, req)
        .await
        .map_err(core_error)?;
    Ok(message_with("Project updated successfully", ProjectPayload { project }))
}

async fn delete_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    state.project_store().delete(&actor, id).await.map_err(core_error)?;
    Ok(message("Project deleted successfully"))
}

async fn get_board(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Board>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let board = state.project_store().board(&actor, id).await.map_err(core_error)?;
    Ok(Json(board))
}

async fn get_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ShareState>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let share = state.share_issuer().state(&actor, id).await.map_err(core_error)?;
    Ok(Json(share))
}

async fn toggle_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<ShareToggleRequest>, JsonRejection>,
) -> Result<Json<MessageWith<ShareState>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let share = state
        .share_issuer()
        .set_public(&actor, id, req.is_public)
        .await
        .map_err(core_error)?;
    let text = if share.is_public {
        "Public sharing enabled"
    } else {
        "Public sharing disabled"
    };
    Ok(message_with(text, share))
}

async fn regenerate_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageWith<ShareState>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let share = state
        .share_issuer()
        .regenerate(&actor, id)
        .await
        .map_err(core_error)?;
    Ok(message_with("Share link regenerated", share))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/board", get(get_board))
        .route("/api/projects/{id}/share", get(get_share).post(toggle_share))
        .route("/api/projects/{id}/share/regenerate", post(regenerate_share))
}
