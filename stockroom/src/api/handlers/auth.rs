//! Login endpoint backed by the configured credential store.

use crate::AppState;
use crate::api::models::auth::{LoginRequest, LoginResponse};
use crate::auth::Role;
use crate::errors::Result;
use axum::{Json, extract::State};

fn welcome_message(role: Role) -> String {
    let title = match role {
        Role::Admin => "Admin",
        Role::Editor => "Editor",
        Role::Viewer => "Viewer",
    };
    format!("Welcome {}!", title)
}

#[utoipa::path(
    post,
    path = "/authentication/login",
    tag = "auth",
    summary = "Log in",
    description = "Check a username and password against the configured accounts and return \
                   the library view the caller should land on.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 401, description = "Unknown user or wrong password")
    )
)]
#[tracing::instrument(skip_all, fields(username = %request.username))]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>> {
    let grant = state.gate.authenticate(&request.username, &request.password).await?;
    tracing::info!(role = %grant.role, "Login accepted");
    Ok(Json(LoginResponse {
        role: grant.role,
        view: grant.view,
        message: welcome_message(grant.role),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LibraryView;
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_routes_each_role_to_its_view() {
        let app = create_test_app();
        for (username, view, message) in [
            ("admin", LibraryView::Library, "Welcome Admin!"),
            ("editor", LibraryView::EditorLibrary, "Welcome Editor!"),
            ("viewer", LibraryView::ViewerLibrary, "Welcome Viewer!"),
        ] {
            let response = app
                .post("/authentication/login")
                .json(&json!({"username": username, "password": username}))
                .await;
            response.assert_status_ok();
            let body: LoginResponse = response.json();
            assert_eq!(body.view, view);
            assert_eq!(body.message, message);
        }
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let app = create_test_app();
        let response = app
            .post("/authentication/login")
            .json(&json!({"username": "mallory", "password": "hunter2"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "User 'mallory' does not exist.");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = create_test_app();
        let response = app
            .post("/authentication/login")
            .json(&json!({"username": "admin", "password": "nope"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "Wrong password for admin.");
    }
}
