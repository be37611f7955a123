use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use service_core::middleware::RequestId;
use tower_sessions::Session;

use crate::navigation::{NavigationView, MAIN_MENU};
use crate::services::api_gateway::RequestOptions;
use crate::session::{get_role, CredentialVault, Role, SessionCredentialStore};

/// Profile of the signed-in user as returned by the profile endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct UserProfile {
    pub id: serde_json::Value,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl UserProfile {
    pub fn name(&self) -> String {
        let full_name = format!("{} {}", self.first_name, self.last_name);
        let full_name = full_name.trim();
        if !full_name.is_empty() {
            full_name.to_string()
        } else if !self.username.is_empty() {
            self.username.clone()
        } else {
            self.email.split('@').next().unwrap_or("User").to_string()
        }
    }

    pub fn initials(&self) -> String {
        let initials: String = self
            .name()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .collect();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials.to_uppercase()
        }
    }
}

#[derive(Deserialize)]
struct NavQuery {
    nav: Option<String>,
}

/// Per-request view of the signed-in caller, extracted from the session.
///
/// The role is re-read from the session on every request so the sidebar
/// always reflects the stored credential.
pub struct ConsoleSession {
    pub store: SessionCredentialStore,
    pub role: Option<Role>,
    pub nav: NavigationView,
    pub request_id: Option<String>,
}

impl ConsoleSession {
    /// Request options carrying this request's correlation id.
    pub fn options(&self) -> RequestOptions {
        RequestOptions::default().with_request_id(self.request_id.clone())
    }

    pub fn role_label(&self) -> &'static str {
        self.role.map_or("No role", |role| role.label())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ConsoleSession
where
    S: Send + Sync,
    CredentialVault: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;

        let store = SessionCredentialStore::new(session, CredentialVault::from_ref(state));
        let role = get_role(&store).await;

        let nav_param = Query::<NavQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.nav);
        let nav = NavigationView::new(MAIN_MENU, role, parts.uri.path(), nav_param.as_deref());

        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|RequestId(id)| id.clone());

        Ok(ConsoleSession {
            store,
            role,
            nav,
            request_id,
        })
    }
}
