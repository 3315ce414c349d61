//! Registration, login and the current user

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pm_core::user::{User, UserSummary};
use serde::{Deserialize, Serialize};

use super::{
    core_error, current_actor, forbidden, json_body, route_error, unauthorized, RouteError,
};
use crate::{auth::issue_user_jwt, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: String,
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    message: &'static str,
    token: String,
    expires_at: String,
    user: User,
}

#[derive(Debug, Serialize)]
struct MeResponse {
    user: User,
}

#[derive(Debug, Serialize)]
struct UsersResponse {
    users: Vec<UserSummary>,
}

fn format_expiry(exp: usize) -> String {
    DateTime::<Utc>::from_timestamp(exp as i64, 0)
        .map(|value| value.to_rfc3339())
        .unwrap_or_else(|| Utc::now().to_rfc3339())
}

fn auth_response(
    state: &AppState,
    message: &'static str,
    user: User,
) -> Result<AuthResponse, RouteError> {
    let config = state.config();
    let (token, exp) = issue_user_jwt(user.id, user.role, &config.jwt_secret, config.token_ttl_hours)
        .map_err(|err| route_error(StatusCode::INTERNAL_SERVER_ERROR, err))?;
    Ok(AuthResponse {
        message,
        token,
        expires_at: format_expiry(exp),
        user,
    })
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), RouteError> {
    if !state.config().allow_registration {
        return Err(forbidden("Registration is disabled"));
    }
    let req = json_body(payload)?;

    let user = state
        .user_store()
        .register(&req.email, &req.password, &req.name)
        .await
        .map_err(core_error)?;

    let response = auth_response(&state, "Account created successfully", user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, RouteError> {
    let req = json_body(payload)?;
    let user = state
        .user_store()
        .authenticate(&req.email, &req.password)
        .await
        .map_err(core_error)?
        .ok_or_else(|| {
            tracing::warn!("Rejected login for {}", req.email.trim());
            unauthorized("Invalid email or password")
        })?;

    Ok(Json(auth_response(&state, "Logged in successfully", user)?))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, RouteError> {
    let actor = current_actor(&state, &headers).await?;
    let user = state
        .user_store()
        .get(actor.user_id)
        .await
        .map_err(core_error)?
        .ok_or_else(|| unauthorized("User not found"))?;
    Ok(Json(MeResponse { user }))
}

async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsersResponse>, RouteError> {
    current_actor(&state, &headers).await?;
    let users = state.user_store().list().await.map_err(core_error)?;
    Ok(Json(UsersResponse { users }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/users", get(list_users))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{build_app, register, send};

    #[tokio::test]
    async fn register_and_login_return_jwt() {
        let app = build_app();
        let token = register(&app, "admin@example.com", "Admin").await;

        let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "admin@example.com");
        assert_eq!(body["user"]["role"], "administrator");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ADMIN@example.com", "password": "password-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some());
        assert_eq!(body["message"], "Logged in successfully");
    }

    #[tokio::test]
    async fn second_user_is_member() {
        let app = build_app();
        register(&app, "admin@example.com", "Admin").await;
        let token = register(&app, "dev@example.com", "Dev").await;

        let (_, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(body["user"]["role"], "member");

        let (status, body) = send(&app, "GET", "/api/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let app = build_app();
        register(&app, "admin@example.com", "Admin").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "admin@example.com", "password": "password-2", "name": "Again" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn bad_credentials_and_missing_token_are_unauthorized() {
        let app = build_app();
        register(&app, "admin@example.com", "Admin").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "admin@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, "GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");

        let (status, _) = send(&app, "GET", "/api/users", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = build_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "admin@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
