use crate::session::{Role, RoleSet};
use thiserror::Error;

const ADMIN_ONLY: RoleSet = RoleSet::new(&[Role::Admin]);
const TEAM_STAFF: RoleSet = RoleSet::new(&[Role::Admin, Role::TeamCaptain]);

#[derive(Debug, Clone, Copy)]
pub struct MenuEntry {
    /// Icon name, rendered as the `icon-<name>` CSS class.
    pub icon: &'static str,
    pub title: &'static str,
    pub path: &'static str,
    pub restriction: Option<RoleSet>,
}

#[derive(Debug, Clone, Copy)]
pub struct MenuSection {
    pub key: &'static str,
    pub label: &'static str,
    pub restriction: Option<RoleSet>,
    pub entries: &'static [MenuEntry],
}

const fn entry(icon: &'static str, title: &'static str, path: &'static str) -> MenuEntry {
    MenuEntry {
        icon,
        title,
        path,
        restriction: None,
    }
}

const fn restricted(
    icon: &'static str,
    title: &'static str,
    path: &'static str,
    roles: RoleSet,
) -> MenuEntry {
    MenuEntry {
        icon,
        title,
        path,
        restriction: Some(roles),
    }
}

/// Every section and entry the console can show. Paths must agree with
/// the guards in `routing::table`.
pub static MAIN_MENU: &[MenuSection] = &[
    MenuSection {
        key: "dashboard",
        label: "DASHBOARD",
        restriction: None,
        entries: &[entry("home", "Dashboard", "/dashboard")],
    },
    MenuSection {
        key: "events",
        label: "EVENTS",
        restriction: None,
        entries: &[
            entry("pin", "View Events", "/events"),
            entry("calendar", "Sport Events", "/sport-events"),
        ],
    },
    MenuSection {
        key: "teams",
        label: "TEAMS",
        restriction: None,
        entries: &[
            entry("clipboard", "Manage Teams & Players", "/teams"),
            restricted(
                "clipboard-pen",
                "Register & Approve Teams",
                "/teams/registrations",
                TEAM_STAFF,
            ),
        ],
    },
    MenuSection {
        key: "admin-panel",
        label: "ADMIN PANEL",
        restriction: Some(ADMIN_ONLY),
        entries: &[entry("users", "Users", "/admin-panel/users")],
    },
    MenuSection {
        key: "settings",
        label: "SETTINGS",
        restriction: None,
        entries: &[
            entry("user", "My Profile", "/settings/profile"),
            entry("key", "Change Password", "/settings/change-password"),
            restricted("key", "Manage Users", "/admin-panel/users", ADMIN_ONLY),
        ],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("Duplicate menu section key: {0}")]
    DuplicateSection(&'static str),

    #[error("Entry '{entry}' in section '{section}' is visible to roles its section excludes")]
    LooserThanSection {
        section: &'static str,
        entry: &'static str,
    },
}

/// Check the declaration invariants: section keys are unique and no entry
/// admits a role its section does not.
pub fn validate_menu(menu: &[MenuSection]) -> Result<(), MenuError> {
    for (index, section) in menu.iter().enumerate() {
        if menu[..index].iter().any(|other| other.key == section.key) {
            return Err(MenuError::DuplicateSection(section.key));
        }

        let Some(section_roles) = section.restriction else {
            continue;
        };
        for item in section.entries {
            if let Some(entry_roles) = item.restriction {
                if !entry_roles.is_subset_of(&section_roles) {
                    return Err(MenuError::LooserThanSection {
                        section: section.key,
                        entry: item.title,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_menu_is_valid() {
        assert_eq!(validate_menu(MAIN_MENU), Ok(()));
    }

    #[test]
    fn rejects_entry_looser_than_section() {
        static BAD: &[MenuSection] = &[MenuSection {
            key: "admin",
            label: "ADMIN",
            restriction: Some(ADMIN_ONLY),
            entries: &[restricted("users", "Teams", "/teams", TEAM_STAFF)],
        }];

        assert_eq!(
            validate_menu(BAD),
            Err(MenuError::LooserThanSection {
                section: "admin",
                entry: "Teams",
            })
        );
    }

    #[test]
    fn rejects_duplicate_keys() {
        static BAD: &[MenuSection] = &[
            MenuSection {
                key: "a",
                label: "A",
                restriction: None,
                entries: &[],
            },
            MenuSection {
                key: "a",
                label: "B",
                restriction: None,
                entries: &[],
            },
        ];

        assert_eq!(validate_menu(BAD), Err(MenuError::DuplicateSection("a")));
    }
}
