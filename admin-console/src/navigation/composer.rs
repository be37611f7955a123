use super::menu::MenuSection;
use crate::session::role::permits;
use crate::session::Role;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleEntry {
    pub icon: &'static str,
    pub title: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleSection {
    pub key: &'static str,
    pub label: &'static str,
    pub entries: Vec<VisibleEntry>,
}

/// Filter the menu declaration down to what `role` may see, preserving
/// declaration order. Pure: same menu and role always give the same output.
pub fn compose(menu: &[MenuSection], role: Option<Role>) -> Vec<VisibleSection> {
    menu.iter()
        .filter(|section| permits(section.restriction, role))
        .map(|section| VisibleSection {
            key: section.key,
            label: section.label,
            entries: section
                .entries
                .iter()
                .filter(|entry| permits(entry.restriction, role))
                .map(|entry| VisibleEntry {
                    icon: entry.icon,
                    title: entry.title,
                    path: entry.path,
                })
                .collect(),
        })
        .collect()
}

/// Which sidebar section is expanded. At most one is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accordion {
    open: Option<String>,
}

impl Accordion {
    pub fn new(open: Option<&str>) -> Self {
        Self {
            open: open.map(str::to_string),
        }
    }

    pub fn open_section(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn is_open(&self, key: &str) -> bool {
        self.open.as_deref() == Some(key)
    }

    /// Opening a section closes the other one; toggling the open one closes it.
    pub fn toggle(&mut self, key: &str) {
        if self.is_open(key) {
            self.open = None;
        } else {
            self.open = Some(key.to_string());
        }
    }
}

/// Sidebar model handed to page templates.
///
/// The accordion lives only in the `nav` query parameter of the current URL:
/// absent means "expand the section holding the current page", empty means
/// "all collapsed".
#[derive(Debug, Clone)]
pub struct NavigationView {
    pub sections: Vec<VisibleSection>,
    pub accordion: Accordion,
    pub current_path: String,
}

impl NavigationView {
    pub fn new(
        menu: &[MenuSection],
        role: Option<Role>,
        current_path: &str,
        nav_param: Option<&str>,
    ) -> Self {
        let sections = compose(menu, role);
        let open = match nav_param {
            Some("") => None,
            Some(key) => sections
                .iter()
                .find(|section| section.key == key)
                .map(|section| section.key),
            None => sections
                .iter()
                .find(|section| {
                    section
                        .entries
                        .iter()
                        .any(|entry| entry.path == current_path)
                })
                .map(|section| section.key),
        };

        Self {
            sections,
            accordion: Accordion::new(open),
            current_path: current_path.to_string(),
        }
    }

    pub fn is_open(&self, key: &str) -> bool {
        self.accordion.is_open(key)
    }

    pub fn is_active(&self, path: &str) -> bool {
        self.current_path == path
    }

    /// Link that toggles `key` while staying on the current page.
    pub fn toggle_href(&self, key: &str) -> String {
        let mut next = self.accordion.clone();
        next.toggle(key);
        format!(
            "{}?nav={}",
            self.current_path,
            next.open_section().unwrap_or_default()
        )
    }
}
