//! Task API endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use pm_core::task::{CreateTaskRequest, MoveTaskRequest, TaskView, UpdateTaskRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    core_error, current_actor, json_body, message, message_with, Message, MessageWith, RouteError,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct TasksResponse {
    tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
struct TaskPayload {
    task: TaskView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderTasksRequest {
    task_ids: Vec<Uuid>,
}

async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
) -> Result<Json<TasksResponse>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let tasks = state
        .task_store()
        .list(&actor, project_id)
        .await
        .map_err(core_error)?;
    Ok(Json(TasksResponse { tasks }))
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageWith<TaskPayload>>), RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let task = state
        .task_store()
        .create(&actor, project_id, req)
        .await
        .map_err(core_error)?;
    Ok((
        StatusCode::CREATED,
        message_with("Task created successfully", TaskPayload { task }),
    ))
}

async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskPayload>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let task = state.task_store().get(&actor, id).await.map_err(core_error)?;
    Ok(Json(TaskPayload { task }))
}

async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<MessageWith<TaskPayload>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let task = state
        .task_store()
        .update(&actor, id, req)
        .await
        .map_err(core_error)?;
    Ok(message_with("Task updated successfully", TaskPayload { task }))
}

async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    state.task_store().delete(&actor, id).await.map_err(core_error)?;
    Ok(message("Task deleted successfully"))
}

async fn move_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<MoveTaskRequest>, JsonRejection>,
) -> Result<Json<MessageWith<TaskPayload>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let task = state
        .task_store()
        .move_task(&actor, id, req)
        .await
        .map_err(core_error)?;
    Ok(message_with("Task moved successfully", TaskPayload { task }))
}

async fn reorder_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(status_id): Path<Uuid>,
    payload: Result<Json<ReorderTasksRequest>, JsonRejection>,
) -> Result<Json<MessageWith<TasksResponse>>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let req = json_body(payload)?;
    let tasks = state
        .task_store()
        .reorder(&actor, status_id, req.task_ids)
        .await
        .map_err(core_error)?;
    Ok(message_with("Tasks reordered successfully", TasksResponse { tasks }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/projects/{id}/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/move", post(move_task))
        .route("/api/statuses/{id}/tasks/order", put(reorder_tasks))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::routes::test_support::{build_app, create_project, register, send};

    async fn create_task(app: &axum::Router, token: &str, project_id: &str, status_id: &str, title: &str) -> Value {
        let (status, body) = send(
            app,
            "POST",
            &format!("/api/projects/{}/tasks", project_id),
            Some(token),
            Some(json!({ "statusId": status_id, "title": title })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["task"].clone()
    }

    #[tokio::test]
    async fn members_create_and_move_tasks() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let member = register(&app, "dev@example.com", "Dev").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;

        let task = create_task(&app, &member, &project_id, &statuses[0], "Landing page").await;
        assert_eq!(task["priority"], "Medium");
        assert_eq!(task["creatorName"], "Dev");
        let task_id = task["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/tasks/{}/move", task_id),
            Some(&member),
            Some(json!({ "statusId": statuses[2], "index": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task moved successfully");
        assert_eq!(body["task"]["statusId"], statuses[2].as_str());
        assert!(body["task"]["completedAt"].is_string());

        let (_, body) = send(
            &app,
            "POST",
            &format!("/api/tasks/{}/move", task_id),
            Some(&member),
            Some(json!({ "statusId": statuses[1] })),
        )
        .await;
        assert!(body["task"]["completedAt"].is_null());
    }

    #[tokio::test]
    async fn update_clears_assignee_with_null() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;
        let (_, me) = send(&app, "GET", "/api/auth/me", Some(&admin), None).await;
        let task = create_task(&app, &admin, &project_id, &statuses[0], "Landing page").await;
        let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&admin),
            Some(json!({ "assigneeId": me["user"]["id"], "priority": "Urgent", "dueDate": "2026-11-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["assigneeName"], "Admin");
        assert_eq!(body["task"]["dueDate"], "2026-11-01");

        let (_, body) = send(&app, "PUT", &uri, Some(&admin), Some(json!({ "assigneeId": null }))).await;
        assert!(body["task"]["assigneeId"].is_null());
        assert_eq!(body["task"]["priority"], "Urgent");

        let (status, _) = send(&app, "PUT", &uri, Some(&admin), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reorder_tasks_in_status() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;
        let a = create_task(&app, &admin, &project_id, &statuses[0], "A").await;
        let b = create_task(&app, &admin, &project_id, &statuses[0], "B").await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/statuses/{}/tasks/order", statuses[0]),
            Some(&admin),
            Some(json!({ "taskIds": [b["id"], a["id"]] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn delete_task_then_not_found() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;
        let task = create_task(&app, &admin, &project_id, &statuses[0], "A").await;
        let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

        let (status, body) = send(&app, "DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task deleted successfully");

        let (status, _) = send(&app, "GET", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
