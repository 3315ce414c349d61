//! Board column endpoints

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use pm_core::status::{
    CreateStatusRequest, OrphanedTasks, Status, StatusDeletion, UpdateStatusRequest,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    bad_request, core_error, current_actor, json_body, message_with, query_params, MessageWith,
    RouteError,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct StatusesResponse {
    statuses: Vec<Status>,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    status: Status,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderStatusesRequest {
    status_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteStatusQuery {
    #[serde(default)]
    move_tasks_to: Option<Uuid>,
}

async fn list_statuses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
) -> Result<Json<StatusesResponse>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let statuses = state
        .status_store()
        .list(&actor, project_id)
        .await
        .map_err(core_error)?;
    Ok(Json(StatusesResponse { statuses }))
}

async fn create_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<CreateStatusRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageWith<StatusPayload>>), RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let status = state
        .status_store()
        .create(&actor, project_id, req)
        .await
        .map_err(core_error)?;
    Ok((
        StatusCode::CREATED,
        message_with("Status created successfully", StatusPayload { status }),
    ))
}

async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MessageWith<StatusPayload>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let status = state
        .status_store()
        .update(&actor, id, req)
        .await
        .map_err(core_error)?;
    Ok(message_with("Status updated successfully", StatusPayload { status }))
}

async fn delete_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    query: Result<Query<DeleteStatusQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<MessageWith<StatusDeletion>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let mut target = query_params(query)?.move_tasks_to;
    // The target may also arrive in an optional JSON body
    if target.is_none() && !body.is_empty() {
        let from_body: DeleteStatusQuery = serde_json::from_slice(&body)
            .map_err(|err| bad_request(format!("Invalid request body: {}", err)))?;
        target = from_body.move_tasks_to;
    }
    let outcome = state
        .status_store()
        .delete(&actor, id, OrphanedTasks::from(target))
        .await
        .map_err(core_error)?;
    Ok(message_with("Status deleted successfully", outcome))
}

async fn reorder_statuses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<ReorderStatusesRequest>, JsonRejection>,
) -> Result<Json<MessageWith<StatusesResponse>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let statuses = state
        .status_store()
        .reorder(&actor, project_id, req.status_ids)
        .await
        .map_err(core_error)?;
    Ok(message_with("Statuses reordered successfully", StatusesResponse { statuses }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/projects/{id}/statuses",
            get(list_statuses).post(create_status),
        )
        .route("/api/projects/{id}/statuses/order", put(reorder_statuses))
        .route("/api/statuses/{id}", put(update_status).delete(delete_status))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{build_app, create_project, register, send};

    #[tokio::test]
    async fn reorder_statuses_round_trip() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;
        let reversed: Vec<&String> = statuses.iter().rev().collect();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/projects/{}/statuses/order", project_id),
            Some(&admin),
            Some(json!({ "statusIds": reversed })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ordered: Vec<(&str, i64)> = body["statuses"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| (s["id"].as_str().unwrap(), s["orderIndex"].as_i64().unwrap()))
            .collect();
        assert_eq!(
            ordered,
            vec![(statuses[2].as_str(), 0), (statuses[1].as_str(), 1), (statuses[0].as_str(), 2)]
        );
    }

    #[tokio::test]
    async fn foreign_status_rejects_whole_reorder() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;
        let (_, other_statuses) = create_project(&app, &admin, "Other").await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/projects/{}/statuses/order", project_id),
            Some(&admin),
            Some(json!({ "statusIds": [other_statuses[0], statuses[0]] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("does not belong"));
    }

    #[tokio::test]
    async fn delete_status_moves_tasks() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;
        send(
            &app,
            "POST",
            &format!("/api/projects/{}/tasks", project_id),
            Some(&admin),
            Some(json!({ "statusId": statuses[0], "title": "Draft" })),
        )
        .await;

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/statuses/{}?moveTasksTo={}", statuses[0], statuses[1]),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movedTasks"], 1);
        assert_eq!(body["deletedTasks"], 0);

        let (_, board) = send(
            &app,
            "GET",
            &format!("/api/projects/{}/board", project_id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(board["statuses"].as_array().unwrap().len(), 2);
        assert_eq!(board["tasks"][0]["statusId"], statuses[1].as_str());
    }

    #[tokio::test]
    async fn delete_status_reads_target_from_body() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;
        send(
            &app,
            "POST",
            &format!("/api/projects/{}/tasks", project_id),
            Some(&admin),
            Some(json!({ "statusId": statuses[1], "title": "Review copy" })),
        )
        .await;

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/statuses/{}", statuses[1]),
            Some(&admin),
            Some(json!({ "moveTasksTo": statuses[2] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["movedTasks"], 1);
    }

    #[tokio::test]
    async fn members_cannot_create_statuses() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let member = register(&app, "dev@example.com", "Dev").await;
        let (project_id, _) = create_project(&app, &admin, "Website").await;

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/projects/{}/statuses", project_id),
            Some(&member),
            Some(json!({ "name": "Review" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/projects/{}/statuses", project_id),
            Some(&admin),
            Some(json!({ "name": "Review", "color": "#8b5cf6" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"]["orderIndex"], 3);
    }
}
