use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

struct ConsoleMetrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    session_renewals_total: IntCounterVec,
    guard_decisions_total: IntCounterVec,
}

// Global registry
static METRICS: OnceLock<ConsoleMetrics> = OnceLock::new();

fn build_metrics() -> Result<ConsoleMetrics, prometheus::Error> {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let http_request_duration_seconds = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let session_renewals_total = IntCounterVec::new(
        Opts::new(
            "session_renewals_total",
            "Access credential renewal exchanges by outcome",
        ),
        &["outcome"],
    )?;
    let guard_decisions_total = IntCounterVec::new(
        Opts::new("guard_decisions_total", "Route guard decisions by outcome"),
        &["decision"],
    )?;

    registry.register(Box::new(http_requests_total.clone()))?;
    registry.register(Box::new(http_request_duration_seconds.clone()))?;
    registry.register(Box::new(session_renewals_total.clone()))?;
    registry.register(Box::new(guard_decisions_total.clone()))?;

    Ok(ConsoleMetrics {
        registry,
        http_requests_total,
        http_request_duration_seconds,
        session_renewals_total,
        guard_decisions_total,
    })
}

/// Register the console's collectors. Only the first successful call has an
/// effect; recording before it is a no-op.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_none() {
        let _ = METRICS.set(build_metrics()?);
    }
    Ok(())
}

pub fn record_http_request(method: &str, path: &str, status: &str, seconds: f64) {
    if let Some(metrics) = METRICS.get() {
        let labels = [method, path, status];
        metrics.http_requests_total.with_label_values(&labels).inc();
        metrics
            .http_request_duration_seconds
            .with_label_values(&labels)
            .observe(seconds);
    }
}

pub fn record_renewal(outcome: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .session_renewals_total
            .with_label_values(&[outcome])
            .inc();
    }
}

pub fn record_guard_decision(decision: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .guard_decisions_total
            .with_label_values(&[decision])
            .inc();
    }
}

/// Text exposition of every registered metric; empty before `init_metrics`.
pub fn get_metrics() -> Result<String, prometheus::Error> {
    let Some(metrics) = METRICS.get() else {
        return Ok(String::new());
    };

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
