//! Route handlers
//!
//! Every handler returns `Result<_, RouteError>`; failures serialize as
//! `{ "error": "..." }` with the matching status code.

pub mod auth;
pub mod daily_entry;
pub mod health;
pub mod project;
pub mod share;
pub mod status;
pub mod task;
pub mod timesheet;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderMap, StatusCode},
    Json, Router,
};
use pm_core::Actor;
use serde::Serialize;

use crate::auth::resolve_user_identity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type RouteError = (StatusCode, Json<ErrorResponse>);

/// Success body of a mutation
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Success body of a mutation that returns data next to the message
#[derive(Debug, Serialize)]
pub struct MessageWith<T> {
    pub message: &'static str,
    #[serde(flatten)]
    pub data: T,
}

pub fn message(message: &'static str) -> Json<Message> {
    Json(Message { message })
}

pub fn message_with<T: Serialize>(message: &'static str, data: T) -> Json<MessageWith<T>> {
    Json(MessageWith { message, data })
}

pub fn route_error(status: StatusCode, error: impl Into<String>) -> RouteError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

pub fn unauthorized(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::UNAUTHORIZED, error)
}

pub fn forbidden(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::FORBIDDEN, error)
}

pub fn bad_request(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::BAD_REQUEST, error)
}

/// Map a core error to its HTTP status
pub fn core_error(err: pm_core::Error) -> RouteError {
    use pm_core::Error;

    match err {
        Error::Unauthenticated => unauthorized(err.to_string()),
        Error::Forbidden(message) => forbidden(message),
        Error::NotFound(message) => route_error(StatusCode::NOT_FOUND, message),
        Error::InvalidInput(message) => bad_request(message),
        Error::Conflict(message) => route_error(StatusCode::CONFLICT, message),
        Error::Database(_) | Error::Io(_) | Error::Storage(_) => {
            tracing::error!("Request failed: {}", err);
            route_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Unwrap a JSON body, reporting malformed input as a 400 `{error}`
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RouteError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| bad_request(rejection.body_text()))
}

pub fn query_params<T>(
    query: Result<axum::extract::Query<T>, QueryRejection>,
) -> Result<T, RouteError> {
    query
        .map(|axum::extract::Query(value)| value)
        .map_err(|rejection| bad_request(rejection.body_text()))
}

/// Resolve the acting user from the bearer token
///
/// The user is reloaded so a deleted account or a changed role takes effect
/// before the token expires.
pub async fn current_actor(state: &AppState, headers: &HeaderMap) -> Result<Actor, RouteError> {
    let identity =
        resolve_user_identity(headers, &state.config().jwt_secret).map_err(unauthorized)?;
    let user = state
        .user_store()
        .get(identity.user_id)
        .await
        .map_err(core_error)?
        .ok_or_else(|| unauthorized("User not found"))?;
    Ok(Actor::from(&user))
}

/// All API routes
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(project::router())
        .merge(share::router())
        .merge(status::router())
        .merge(task::router())
        .merge(daily_entry::router())
        .merge(timesheet::router())
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use pm_core::Database;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::ServerConfig;
    use crate::state::AppState;

    pub fn build_app() -> Router {
        let db = Database::open_in_memory().unwrap();
        let config = ServerConfig {
            public_base_url: "https://example.com/board".to_string(),
            ..ServerConfig::default()
        };
        super::router().with_state(AppState::with_database(db, config))
    }

    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register a user and return their token
    pub async fn register(app: &Router, email: &str, name: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "password-1", "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a project as `token` and return its id and status ids
    pub async fn create_project(app: &Router, token: &str, name: &str) -> (String, Vec<String>) {
        let (status, body) = send(
            app,
            "POST",
            "/api/projects",
            Some(token),
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let project_id = body["project"]["id"].as_str().unwrap().to_string();

        let (_, statuses) = send(
            app,
            "GET",
            &format!("/api/projects/{}/statuses", project_id),
            Some(token),
            None,
        )
        .await;
        let status_ids = statuses["statuses"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap().to_string())
            .collect();
        (project_id, status_ids)
    }
}
