use askama::Template;
use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use serde_json::json;

use super::render_detail;
use crate::error::ConsoleError;
use crate::models::ConsoleSession;
use crate::navigation::NavigationView;
use crate::AppState;

const CHANGE_PASSWORD_PATH: &str = "/api/users/change-password/";

#[derive(Template)]
#[template(path = "change_password.html")]
pub struct ChangePasswordTemplate {
    pub nav: NavigationView,
    pub role_label: &'static str,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Deserialize)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

pub async fn settings_index() -> Redirect {
    Redirect::to("/settings/profile")
}

pub async fn profile_page(
    State(state): State<AppState>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    let path = state.gateway.settings().profile_path.clone();
    render_detail(&state, session, &path, "My Profile", "/dashboard").await
}

pub async fn change_password_page(session: ConsoleSession) -> impl IntoResponse {
    ChangePasswordTemplate {
        role_label: session.role_label(),
        nav: session.nav,
        error: None,
        success: false,
    }
}

pub async fn change_password_handler(
    State(state): State<AppState>,
    session: ConsoleSession,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response, ConsoleError> {
    if form.new_password != form.new_password_confirm {
        return Ok(page(
            session,
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("New passwords do not match".to_string()),
        ));
    }

    let response = state
        .gateway
        .send_json(
            &session.store,
            Method::POST,
            CHANGE_PASSWORD_PATH,
            json!({
                "old_password": form.old_password,
                "new_password": form.new_password,
                "new_password_confirm": form.new_password_confirm,
            }),
            session.options(),
        )
        .await?;

    let status = response.status();
    if status.is_success() {
        tracing::info!("Password changed");
        return Ok(page(session, StatusCode::OK, None));
    }

    // The API explains validation failures in its body; show it verbatim.
    let body = response.text().await.unwrap_or_default();
    tracing::info!(status = %status, "Password change rejected");
    let message = if body.trim().is_empty() {
        format!("Password change failed ({})", status)
    } else {
        body
    };
    Ok(page(session, StatusCode::UNPROCESSABLE_ENTITY, Some(message)))
}

fn page(session: ConsoleSession, status: StatusCode, error: Option<String>) -> Response {
    let success = error.is_none();
    (
        status,
        ChangePasswordTemplate {
            role_label: session.role_label(),
            nav: session.nav,
            error,
            success,
        },
    )
        .into_response()
}
