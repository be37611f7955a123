//! Generic table and detail views over API JSON.
//!
//! The console mirrors whatever the API returns; only the columns to show
//! are declared per page.

use serde::Deserialize;
use serde_json::Value;

/// List endpoints answer either with a page-number envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing {
    Page { count: u64, results: Vec<Value> },
    Items(Vec<Value>),
}

impl Listing {
    pub fn into_parts(self) -> (Vec<Value>, u64) {
        match self {
            Listing::Page { count, results } => (results, count),
            Listing::Items(items) => {
                let total = items.len() as u64;
                (items, total)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    /// Dotted path into the item, e.g. `created_by.full_name`.
    pub field: &'static str,
}

pub const fn column(header: &'static str, field: &'static str) -> Column {
    Column { header, field }
}

#[derive(Debug, Clone)]
pub struct TableRow {
    pub href: Option<String>,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TableView {
    pub title: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<TableRow>,
    pub total: u64,
    pub error: Option<String>,
}

impl TableView {
    /// `detail_base` turns each row into a link to `<detail_base>/<id>`.
    pub fn from_listing(
        title: &'static str,
        columns: &[Column],
        listing: Listing,
        detail_base: Option<&str>,
    ) -> Self {
        let (items, total) = listing.into_parts();
        let rows = items
            .iter()
            .map(|item| TableRow {
                href: detail_base
                    .zip(item.get("id").map(display))
                    .map(|(base, id)| format!("{}/{}", base, id)),
                cells: columns
                    .iter()
                    .map(|column| lookup(item, column.field).map_or_else(empty_cell, display))
                    .collect(),
            })
            .collect();

        Self {
            title,
            headers: columns.iter().map(|column| column.header).collect(),
            rows,
            total,
            error: None,
        }
    }

    pub fn failed(title: &'static str, columns: &[Column], message: String) -> Self {
        Self {
            title,
            headers: columns.iter().map(|column| column.header).collect(),
            rows: Vec::new(),
            total: 0,
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetailView {
    pub title: String,
    pub fields: Vec<(String, String)>,
    pub error: Option<String>,
}

impl DetailView {
    /// Every field of a JSON object, ordered by key.
    pub fn from_object(title: impl Into<String>, value: &Value) -> Self {
        let fields = value
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| (humanize(key), display(value)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: title.into(),
            fields,
            error: None,
        }
    }

    pub fn failed(title: impl Into<String>, message: String) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            error: Some(message),
        }
    }
}

fn lookup<'a>(item: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(item, |current, segment| current.get(segment))
}

fn empty_cell() -> String {
    "-".to_string()
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => empty_cell(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => (if *b { "Yes" } else { "No" }).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => format!("{} item(s)", items.len()),
        Value::Object(object) => ["full_name", "name", "email", "id"]
            .iter()
            .find_map(|key| object.get(*key))
            .map_or_else(empty_cell, display),
    }
}

fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}
