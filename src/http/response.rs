//! Error responses.
//!
//! - No backend available (only with `fail_when_unhealthy`) → 503
//! - Forward failure → 502, no retry
//! - Construction-time pool errors never reach a handler; mapped to 500

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::load_balancer::LoadBalancerError;
use crate::routing::RouteError;

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::Select(LoadBalancerError::NoHealthyBackend) => StatusCode::SERVICE_UNAVAILABLE,
            RouteError::Select(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RouteError::Forward { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let body = match &self {
            RouteError::Select(LoadBalancerError::NoHealthyBackend) => "No healthy backends",
            RouteError::Select(_) => "Backend selection failed",
            RouteError::Forward { .. } => "Upstream request failed",
        };
        (self.status(), body).into_response()
    }
}
