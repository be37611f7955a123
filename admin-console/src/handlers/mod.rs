//! Page handlers. Each page fetches through the request gateway and renders
//! the API payload; none of them interpret business data.

pub mod admin;
pub mod app;
pub mod auth;
pub mod dashboard;
pub mod events;
pub mod metrics;
pub mod settings;
pub mod teams;

use askama::Template;
use axum::response::{IntoResponse, Response};

use crate::error::ConsoleError;
use crate::models::{Column, ConsoleSession, DetailView, Listing, TableView};
use crate::navigation::NavigationView;
use crate::AppState;

#[derive(Template)]
#[template(path = "table.html")]
pub struct TablePage {
    pub nav: NavigationView,
    pub role_label: &'static str,
    pub table: TableView,
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct DetailPage {
    pub nav: NavigationView,
    pub role_label: &'static str,
    pub detail: DetailView,
    pub back_href: &'static str,
}

/// Fetch a list endpoint and render it as a table. API errors are shown on
/// the page; only an expired session aborts the render.
pub(crate) async fn render_table(
    state: &AppState,
    session: ConsoleSession,
    api_path: &str,
    title: &'static str,
    columns: &[Column],
    detail_base: Option<&str>,
) -> Result<Response, ConsoleError> {
    let response = state
        .gateway
        .get(&session.store, api_path, session.options())
        .await?;

    let table = if response.status().is_success() {
        let listing: Listing = response.json().await?;
        TableView::from_listing(title, columns, listing, detail_base)
    } else {
        tracing::warn!(path = %api_path, status = %response.status(), "List request failed");
        TableView::failed(
            title,
            columns,
            format!("Failed to load {} ({})", title.to_lowercase(), response.status()),
        )
    };

    Ok(TablePage {
        role_label: session.role_label(),
        nav: session.nav,
        table,
    }
    .into_response())
}

/// Fetch one object and render its fields.
pub(crate) async fn render_detail(
    state: &AppState,
    session: ConsoleSession,
    api_path: &str,
    title: &str,
    back_href: &'static str,
) -> Result<Response, ConsoleError> {
    let response = state
        .gateway
        .get(&session.store, api_path, session.options())
        .await?;

    let detail = if response.status().is_success() {
        let value: serde_json::Value = response.json().await?;
        DetailView::from_object(title, &value)
    } else {
        tracing::warn!(path = %api_path, status = %response.status(), "Detail request failed");
        DetailView::failed(title, format!("Failed to load {} ({})", title, response.status()))
    };

    Ok(DetailPage {
        role_label: session.role_label(),
        nav: session.nav,
        detail,
        back_href,
    }
    .into_response())
}

/// Object ids are UUIDs or integers; anything else never reaches the API.
pub(crate) fn checked_id(id: &str) -> Result<&str, ConsoleError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        Ok(id)
    } else {
        Err(service_core::error::AppError::NotFound(anyhow::anyhow!("Unknown id: {}", id)).into())
    }
}
