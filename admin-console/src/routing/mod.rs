//! Route tree and the guard decisions applied to every console page.

pub mod guard;
pub mod table;

pub use guard::{authorize, decide, nearest_permitted_ancestor, GuardDecision};
pub use table::{guard_for, Guard, RouteRule, LANDING_PATH, LOGIN_PATH, ROUTE_TREE};
