use super::table::{guard_for, Guard, LANDING_PATH, LOGIN_PATH};
use crate::session::AuthState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(String),
    /// Signed in, but the role is not on the allow-list. The caller is sent
    /// to the nearest ancestor it may see.
    Forbidden { redirect_to: String },
}

impl GuardDecision {
    pub fn label(&self) -> &'static str {
        match self {
            GuardDecision::Render => "render",
            GuardDecision::Redirect(_) => "redirect",
            GuardDecision::Forbidden { .. } => "forbidden",
        }
    }
}

/// Terminal decision for one guard. The role check only runs once the
/// caller is known to be signed in.
pub fn decide(guard: Guard, state: AuthState) -> GuardDecision {
    match (guard, state) {
        (Guard::AnonymousOnly, AuthState::Anonymous) => GuardDecision::Render,
        (Guard::AnonymousOnly, AuthState::Authenticated { .. }) => {
            GuardDecision::Redirect(LANDING_PATH.to_string())
        }
        (_, AuthState::Anonymous) => GuardDecision::Redirect(LOGIN_PATH.to_string()),
        (Guard::Authenticated, AuthState::Authenticated { .. }) => GuardDecision::Render,
        (Guard::Role(allowed), AuthState::Authenticated { role }) if allowed.permits(role) => {
            GuardDecision::Render
        }
        (Guard::Role(_), AuthState::Authenticated { .. }) => GuardDecision::Forbidden {
            redirect_to: LANDING_PATH.to_string(),
        },
    }
}

/// Closest ancestor of `path` the caller would be allowed to render, or the
/// landing page when none is.
pub fn nearest_permitted_ancestor(path: &str, state: AuthState) -> String {
    let mut current = path.trim_end_matches('/');
    while let Some(index) = current.rfind('/') {
        current = &current[..index];
        let candidate = if current.is_empty() { LOGIN_PATH } else { current };
        if decide(guard_for(candidate), state) == GuardDecision::Render {
            return candidate.to_string();
        }
    }
    LANDING_PATH.to_string()
}

/// Route-tree lookup plus guard decision for a concrete request path.
pub fn authorize(path: &str, state: AuthState) -> GuardDecision {
    match decide(guard_for(path), state) {
        GuardDecision::Forbidden { .. } => GuardDecision::Forbidden {
            redirect_to: nearest_permitted_ancestor(path, state),
        },
        decision => decision,
    }
}
