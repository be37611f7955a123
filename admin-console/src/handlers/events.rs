use axum::{
    extract::{Path, State},
    response::Response,
};

use super::{checked_id, render_detail, render_table};
use crate::error::ConsoleError;
use crate::models::listing::column;
use crate::models::{Column, ConsoleSession};
use crate::AppState;

const EVENT_COLUMNS: &[Column] = &[
    column("Name", "name"),
    column("Location", "location"),
    column("Starts", "start_date"),
    column("Ends", "end_date"),
    column("Status", "status_display"),
    column("Sport events", "sport_events_count"),
];

const SPORT_EVENT_COLUMNS: &[Column] = &[
    column("Name", "name"),
    column("Sport", "sport_type_display"),
    column("Starts", "start_date"),
    column("Ends", "end_date"),
    column("Status", "status_display"),
];

pub async fn list_events(
    State(state): State<AppState>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    render_table(
        &state,
        session,
        "/api/events/events/",
        "Events",
        EVENT_COLUMNS,
        Some("/events"),
    )
    .await
}

pub async fn event_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    let path = format!("/api/events/events/{}/", checked_id(&id)?);
    render_detail(&state, session, &path, "Event", "/events").await
}

pub async fn list_sport_events(
    State(state): State<AppState>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    render_table(
        &state,
        session,
        "/api/events/sport-events/",
        "Sport Events",
        SPORT_EVENT_COLUMNS,
        Some("/sport-events"),
    )
    .await
}

pub async fn sport_event_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    let path = format!("/api/events/sport-events/{}/", checked_id(&id)?);
    render_detail(&state, session, &path, "Sport Event", "/sport-events").await
}
