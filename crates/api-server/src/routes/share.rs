//! Unauthenticated read-only boards served through share links

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use pm_core::share::PublicBoard;

use super::{core_error, RouteError};
use crate::state::AppState;

async fn public_board(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicBoard>, RouteError> {
    let board = state.share_issuer().resolve(&token).await.map_err(core_error)?;
    Ok(Json(board))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/public/boards/{token}", get(public_board))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{build_app, create_project, register, send};

    #[tokio::test]
    async fn public_board_follows_share_flag() {
        let app = build_app();
        let admin = register(&app, "admin@example.com", "Admin").await;
        let (project_id, statuses) = create_project(&app, &admin, "Website").await;
        send(
            &app,
            "POST",
            &format!("/api/projects/{}/tasks", project_id),
            Some(&admin),
            Some(json!({ "statusId": statuses[0], "title": "Landing page" })),
        )
        .await;

        let share_uri = format!("/api/projects/{}/share", project_id);
        let (_, body) = send(&app, "POST", &share_uri, Some(&admin), Some(json!({ "isPublic": true }))).await;
        let token = body["shareToken"].as_str().unwrap().to_string();
        let board_uri = format!("/api/public/boards/{}", token);

        let (status, body) = send(&app, "GET", &board_uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project"]["name"], "Website");
        assert_eq!(body["tasks"][0]["title"], "Landing page");
        assert!(body["tasks"][0].get("creatorName").is_none());

        send(&app, "POST", &share_uri, Some(&admin), Some(json!({ "isPublic": false }))).await;
        let (status, body) = send(&app, "GET", &board_uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }
}
