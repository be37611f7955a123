use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of role tags the API assigns to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(alias = "team_manager")]
    TeamCaptain,
    Player,
    Scorekeeper,
    Public,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::TeamCaptain,
        Role::Player,
        Role::Scorekeeper,
        Role::Public,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::TeamCaptain => "team_captain",
            Role::Player => "player",
            Role::Scorekeeper => "scorekeeper",
            Role::Public => "public",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::TeamCaptain => "Team Captain",
            Role::Player => "Player",
            Role::Scorekeeper => "Scorekeeper",
            Role::Public => "Public User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role tag: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            // The API still reports captains under their legacy tag
            "team_captain" | "team_manager" => Ok(Role::TeamCaptain),
            "player" => Ok(Role::Player),
            "scorekeeper" => Ok(Role::Scorekeeper),
            "public" => Ok(Role::Public),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Allow-list of roles attached to a route or menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    pub const fn new(roles: &'static [Role]) -> Self {
        Self(roles)
    }

    pub fn roles(&self) -> &'static [Role] {
        self.0
    }

    /// A caller without a role is never admitted by an allow-list.
    pub fn permits(&self, role: Option<Role>) -> bool {
        role.is_some_and(|role| self.0.contains(&role))
    }

    pub fn is_subset_of(&self, other: &RoleSet) -> bool {
        self.0.iter().all(|role| other.0.contains(role))
    }
}

/// `None` means unrestricted.
pub fn permits(restriction: Option<RoleSet>, role: Option<Role>) -> bool {
    restriction.map_or(true, |set| set.permits(role))
}
