use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ServerSettings;
use crate::handlers::{
    admin::{admin_index, list_users, user_detail},
    app::health_check,
    auth::{login_handler, login_page, logout_handler},
    dashboard::dashboard_handler,
    events::{event_detail, list_events, list_sport_events, sport_event_detail},
    metrics::metrics,
    settings::{change_password_handler, change_password_page, profile_page, settings_index},
    teams::{list_registrations, list_teams, team_detail},
};
use crate::middleware::{metrics_middleware, route_guard};
use crate::AppState;

pub fn build_router(state: AppState, server: &ServerSettings) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            server.session_idle_hours,
        )));

    // Every page below is admitted by the route guard
    let console = Router::new()
        .route("/", get(login_page).post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/events", get(list_events))
        .route("/events/:id", get(event_detail))
        .route("/sport-events", get(list_sport_events))
        .route("/sport-events/:id", get(sport_event_detail))
        .route("/teams", get(list_teams))
        .route("/teams/registrations", get(list_registrations))
        .route("/teams/:id", get(team_detail))
        .route("/admin-panel", get(admin_index))
        .route("/admin-panel/users", get(list_users))
        .route("/admin-panel/users/:id", get(user_detail))
        .route("/settings", get(settings_index))
        .route("/settings/profile", get(profile_page))
        .route(
            "/settings/change-password",
            get(change_password_page).post(change_password_handler),
        )
        .route_layer(from_fn_with_state(state.clone(), route_guard));

    Router::new()
        .merge(console)
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
