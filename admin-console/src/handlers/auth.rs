use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use service_core::middleware::RequestId;
use tower_sessions::Session;

use crate::error::ConsoleError;
use crate::routing::{LANDING_PATH, LOGIN_PATH};
use crate::services::SignInError;
use crate::session::SessionCredentialStore;
use crate::AppState;

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub identifier: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    /// Email or username; the API accepts either.
    pub identifier: String,
    pub password: String,
}

pub async fn login_page() -> impl IntoResponse {
    LoginTemplate::default()
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    request_id: Option<Extension<RequestId>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ConsoleError> {
    let identifier = form.identifier.trim().to_string();
    if identifier.is_empty() || form.password.is_empty() {
        return Ok(login_failed(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Enter your login and password",
            identifier,
        ));
    }

    // New identity, new session id.
    session.cycle_id().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to rotate session id");
        ConsoleError::from(crate::session::StoreError::from(e))
    })?;

    let store = SessionCredentialStore::new(session, state.vault.clone());
    let request_id = request_id.map(|Extension(RequestId(id))| id);

    match state
        .auth_client
        .sign_in(&store, &identifier, &form.password, request_id)
        .await
    {
        Ok(_) => Ok(Redirect::to(LANDING_PATH).into_response()),
        Err(SignInError::InvalidCredentials) => Ok(login_failed(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid login or password",
            identifier,
        )),
        Err(SignInError::UnknownRole(e)) => {
            tracing::warn!(error = %e, "Sign-in refused for account without console role");
            Ok(login_failed(
                StatusCode::FORBIDDEN,
                "This account has no access to the console",
                identifier,
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "Sign-in failed");
            Ok(login_failed(
                StatusCode::BAD_GATEWAY,
                "Sign-in is unavailable, try again later",
                identifier,
            ))
        }
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, ConsoleError> {
    let store = SessionCredentialStore::new(session, state.vault.clone());
    state.auth_client.sign_out(&store).await?;
    Ok(Redirect::to(LOGIN_PATH))
}

fn login_failed(status: StatusCode, message: &str, identifier: String) -> Response {
    (
        status,
        LoginTemplate {
            error: Some(message.to_string()),
            identifier,
        },
    )
        .into_response()
}
