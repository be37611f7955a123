use axum::{
    extract::{Path, State},
    response::Response,
};

use super::{checked_id, render_detail, render_table};
use crate::error::ConsoleError;
use crate::models::listing::column;
use crate::models::{Column, ConsoleSession};
use crate::AppState;

const TEAM_COLUMNS: &[Column] = &[
    column("Team", "name"),
    column("Captain", "captain.full_name"),
    column("Players", "players"),
    column("Created", "created_at"),
];

const REGISTRATION_COLUMNS: &[Column] = &[
    column("Team", "team.name"),
    column("Sport event", "sport_event.name"),
    column("Status", "status"),
    column("Submitted", "created_at"),
];

pub async fn list_teams(
    State(state): State<AppState>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    render_table(
        &state,
        session,
        "/api/teams/teams/",
        "Teams",
        TEAM_COLUMNS,
        Some("/teams"),
    )
    .await
}

pub async fn team_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    let path = format!("/api/teams/teams/{}/", checked_id(&id)?);
    render_detail(&state, session, &path, "Team", "/teams").await
}

/// Pending and decided team registrations (admins and captains only).
pub async fn list_registrations(
    State(state): State<AppState>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    render_table(
        &state,
        session,
        "/api/teams/registrations/",
        "Team Registrations",
        REGISTRATION_COLUMNS,
        None,
    )
    .await
}
