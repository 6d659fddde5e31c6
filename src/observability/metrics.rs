//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_selections_total` (counter): selections by backend
//! - `lb_fallback_selections_total` (counter): picks made with no live backend
//! - `lb_backend_alive` (gauge): 1=alive, 0=dead
//! - `lb_forward_errors_total` (counter): failed forwards by backend
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint. Needs a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_selection(backend: &str, fallback: bool) {
    metrics::counter!("lb_selections_total", "backend" => backend.to_string()).increment(1);
    if fallback {
        metrics::counter!("lb_fallback_selections_total").increment(1);
    }
}

pub fn record_backend_alive(backend: &str, alive: bool) {
    metrics::gauge!("lb_backend_alive", "backend" => backend.to_string()).set(if alive { 1.0 } else { 0.0 });
}

pub fn record_forward_error(backend: &str) {
    metrics::counter!("lb_forward_errors_total", "backend" => backend.to_string()).increment(1);
}
