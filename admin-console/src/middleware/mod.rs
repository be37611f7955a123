pub mod guard;
pub mod metrics;

pub use guard::route_guard;
pub use metrics::metrics_middleware;
