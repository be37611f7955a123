use axum::{
    extract::{Path, State},
    response::{Redirect, Response},
};

use super::{checked_id, render_detail, render_table};
use crate::error::ConsoleError;
use crate::models::listing::column;
use crate::models::{Column, ConsoleSession};
use crate::AppState;

const USER_COLUMNS: &[Column] = &[
    column("Email", "email"),
    column("Username", "username"),
    column("First name", "first_name"),
    column("Last name", "last_name"),
    column("Role", "role"),
    column("Active", "is_active"),
];

pub async fn admin_index() -> Redirect {
    Redirect::to("/admin-panel/users")
}

pub async fn list_users(
    State(state): State<AppState>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    render_table(
        &state,
        session,
        "/api/users/",
        "Users",
        USER_COLUMNS,
        Some("/admin-panel/users"),
    )
    .await
}

pub async fn user_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: ConsoleSession,
) -> Result<Response, ConsoleError> {
    let path = format!("/api/users/{}/", checked_id(&id)?);
    render_detail(&state, session, &path, "User", "/admin-panel/users").await
}
