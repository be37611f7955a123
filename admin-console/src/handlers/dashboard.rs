use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::error::ConsoleError;
use crate::models::{ConsoleSession, UserProfile};
use crate::navigation::NavigationView;
use crate::services::{GatewayError, SignInError};
use crate::AppState;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: NavigationView,
    pub role_label: &'static str,
    pub profile: Option<UserProfile>,
    pub error: Option<String>,
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    let (profile, error) = match state
        .auth_client
        .profile(&session.store, session.request_id.clone())
        .await
    {
        Ok(profile) => (Some(profile), None),
        Err(SignInError::Gateway(GatewayError::SessionExpired)) => {
            return Err(ConsoleError::SessionExpired)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load profile for dashboard");
            (None, Some("Failed to load your profile".to_string()))
        }
    };

    Ok(DashboardTemplate {
        role_label: session.role_label(),
        nav: session.nav,
        profile,
        error,
    }
    .into_response())
}
