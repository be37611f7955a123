use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::routing::{authorize, GuardDecision};
use crate::services::metrics;
use crate::session::{resolve, CredentialVault, SessionCredentialStore};

/// Admit or redirect every console page according to the route tree.
pub async fn route_guard(
    State(vault): State<CredentialVault>,
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Response {
    let store = SessionCredentialStore::new(session, vault);
    let state = resolve(&store).await;
    let decision = authorize(request.uri().path(), state);
    metrics::record_guard_decision(decision.label());

    match decision {
        GuardDecision::Render => next.run(request).await,
        GuardDecision::Redirect(to) => Redirect::to(&to).into_response(),
        GuardDecision::Forbidden { redirect_to } => {
            tracing::warn!(
                path = %request.uri().path(),
                role = ?state.role(),
                redirect_to = %redirect_to,
                "Role not permitted for route"
            );
            Redirect::to(&redirect_to).into_response()
        }
    }
}
