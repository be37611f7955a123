use crate::session::{Role, RoleSet};

/// Login page; the only unauthenticated-only route.
pub const LOGIN_PATH: &str = "/";
/// Where signed-in callers land.
pub const LANDING_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Only callers without a session (login form).
    AnonymousOnly,
    /// Any signed-in caller.
    Authenticated,
    /// Signed-in callers whose role is in the allow-list.
    Role(RoleSet),
}

#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    /// Matches the path itself and everything below it.
    pub prefix: &'static str,
    pub guard: Guard,
}

const fn rule(prefix: &'static str, guard: Guard) -> RouteRule {
    RouteRule { prefix, guard }
}

pub static ROUTE_TREE: &[RouteRule] = &[
    rule(LOGIN_PATH, Guard::AnonymousOnly),
    rule("/logout", Guard::Authenticated),
    rule(LANDING_PATH, Guard::Authenticated),
    rule("/events", Guard::Authenticated),
    rule("/sport-events", Guard::Authenticated),
    rule("/teams", Guard::Authenticated),
    rule(
        "/teams/registrations",
        Guard::Role(RoleSet::new(&[Role::Admin, Role::TeamCaptain])),
    ),
    rule("/admin-panel", Guard::Role(RoleSet::new(&[Role::Admin]))),
    rule("/settings", Guard::Authenticated),
];

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => LOGIN_PATH,
        trimmed => trimmed,
    }
}

fn matches(prefix: &str, path: &str) -> bool {
    if prefix == LOGIN_PATH {
        return path == LOGIN_PATH;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Guard of the most specific rule covering `path`. Console paths without a
/// rule require a session.
pub fn guard_for(path: &str) -> Guard {
    let path = normalize(path);
    ROUTE_TREE
        .iter()
        .filter(|rule| matches(rule.prefix, path))
        .max_by_key(|rule| rule.prefix.len())
        .map_or(Guard::Authenticated, |rule| rule.guard)
}
