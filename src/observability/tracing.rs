//! Request and probe spans.
//!
//! # Responsibilities
//! - Carry the service identity explicitly instead of a process-wide tracer
//! - Open one span per forwarded request naming the destination
//! - Open one span per health probe
//!
//! The context is built once at startup and handed to the request router
//! and the health monitor.

use std::sync::Arc;

use tracing::Span;

use crate::load_balancer::{Backend, Upstream};

/// Tracing context shared by the request path and the health loops.
#[derive(Debug, Clone)]
pub struct TraceContext {
    service: Arc<str>,
}

impl TraceContext {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: Arc::from(service.into()),
        }
    }

    /// Span covering one forwarded request.
    pub fn forward_span(&self, request_id: &str, backend: &Backend) -> Span {
        tracing::info_span!(
            "forward",
            service = %self.service,
            request_id = %request_id,
            backend = %backend.name(),
            addr = %backend.address(),
        )
    }

    /// Span covering one health probe.
    pub fn probe_span(&self, backend: &Backend) -> Span {
        tracing::debug_span!(
            "probe",
            service = %self.service,
            backend = %backend.name(),
            addr = %backend.address(),
        )
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new("wrr-proxy")
    }
}
