//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single downstream server
//! - Hold its scheduling state (WRR credit, liveness, request count)
//! - Probe liveness over plain HTTP
//! - Forward requests through the bound forwarding capability

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, Uri};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time;
use url::Url;

use crate::config::BackendConfig;
use crate::http::client::{Forward, ForwardError};
use crate::load_balancer::{LoadBalancerError, Upstream};
use crate::observability::metrics;

/// Probe deadline.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const PROBE_USER_AGENT: &str = "wrr-proxy-health-check";

/// Mutable scheduling state, guarded by the backend's own lock.
#[derive(Debug)]
struct BackendState {
    /// Requests granted in the current WRR cycle, in `0..=weight`.
    credit: u32,
    alive: bool,
    request_count: u64,
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    name: String,
    address: String,
    weight: u32,
    base_uri: Uri,
    probe_uri: Uri,
    state: Mutex<BackendState>,
    probe_client: Client<HttpConnector, Body>,
    forwarder: Arc<dyn Forward>,
}

/// Point-in-time copy of a backend, for logs and the `check` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendSnapshot {
    pub name: String,
    pub address: String,
    pub weight: u32,
    pub credit: u32,
    pub alive: bool,
    pub request_count: u64,
}

impl Backend {
    /// Create a new backend. It starts out alive until the first probe says otherwise.
    pub fn new(
        name: impl Into<String>,
        address: &str,
        weight: u32,
        forwarder: Arc<dyn Forward>,
    ) -> Result<Self, LoadBalancerError> {
        let base_uri = parse_address(address)?;
        if weight == 0 {
            return Err(LoadBalancerError::InvalidWeight {
                address: address.to_string(),
            });
        }

        let probe_client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            name: name.into(),
            address: address.to_string(),
            weight,
            probe_uri: base_uri.clone(),
            base_uri,
            state: Mutex::new(BackendState {
                credit: 0,
                alive: true,
                request_count: 0,
            }),
            probe_client,
            forwarder,
        })
    }

    /// Build a backend from a descriptor; `index` names it when the descriptor doesn't.
    pub fn from_config(
        index: usize,
        config: &BackendConfig,
        forwarder: Arc<dyn Forward>,
    ) -> Result<Self, LoadBalancerError> {
        let name = config.name.clone().unwrap_or_else(|| index.to_string());
        Self::new(name, &config.address, config.weight, forwarder)
    }

    /// Probe `path` instead of the base address.
    pub fn with_probe_path(mut self, path: &str) -> Result<Self, LoadBalancerError> {
        if path.is_empty() || path == "/" {
            self.probe_uri = self.base_uri.clone();
            return Ok(self);
        }
        let joined = format!("{}/{}", self.address.trim_end_matches('/'), path.trim_start_matches('/'));
        self.probe_uri = parse_address(&joined)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn base_uri(&self) -> &Uri {
        &self.base_uri
    }

    pub fn credit(&self) -> u32 {
        self.state.lock().credit
    }

    pub fn request_count(&self) -> u64 {
        self.state.lock().request_count
    }

    /// Set liveness, returning the previous value.
    pub fn set_alive(&self, alive: bool) -> bool {
        let mut state = self.state.lock();
        std::mem::replace(&mut state.alive, alive)
    }

    pub fn snapshot(&self) -> BackendSnapshot {
        let state = self.state.lock();
        BackendSnapshot {
            name: self.name.clone(),
            address: self.address.clone(),
            weight: self.weight,
            credit: state.credit,
            alive: state.alive,
            request_count: state.request_count,
        }
    }

    // --- Scheduling ---

    /// Count a round-robin grant if the backend is alive.
    pub(crate) fn grant_if_alive(&self) -> bool {
        let mut state = self.state.lock();
        if state.alive {
            state.request_count += 1;
        }
        state.alive
    }

    /// Take one WRR credit slot. Dead backends lose their credit.
    pub(crate) fn take_credit(&self) -> bool {
        let mut state = self.state.lock();
        if !state.alive {
            state.credit = 0;
            return false;
        }
        if state.credit < self.weight {
            state.credit += 1;
            state.request_count += 1;
            return true;
        }
        false
    }

    pub(crate) fn reset_credit(&self) {
        self.state.lock().credit = 0;
    }

    // --- Health ---

    /// Issue one liveness check and record the result.
    ///
    /// Alive iff the GET completes within [`PROBE_TIMEOUT`] with `200 OK`.
    /// Transport errors, timeouts and any other status all count as dead.
    pub async fn probe(&self) -> bool {
        let request = match Request::builder()
            .method("GET")
            .uri(self.probe_uri.clone())
            .header("user-agent", PROBE_USER_AGENT)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(backend = %self.name, error = %e, "Failed to build probe request");
                return self.record_probe(false);
            }
        };

        let alive = match time::timeout(PROBE_TIMEOUT, self.probe_client.request(request)).await {
            Ok(Ok(response)) => {
                let ok = response.status() == StatusCode::OK;
                if !ok {
                    tracing::debug!(backend = %self.name, status = %response.status(), "Probe returned non-OK status");
                }
                ok
            }
            Ok(Err(e)) => {
                tracing::debug!(backend = %self.name, error = %e, "Probe connection error");
                false
            }
            Err(_) => {
                tracing::debug!(backend = %self.name, "Probe timed out");
                false
            }
        };

        self.record_probe(alive)
    }

    fn record_probe(&self, alive: bool) -> bool {
        let was_alive = self.set_alive(alive);
        let status = if alive { "online" } else { "offline" };

        match (was_alive, alive) {
            (true, false) => {
                tracing::warn!(backend = %self.name, addr = %self.address, status, "Backend went offline")
            }
            (false, true) => {
                tracing::info!(backend = %self.name, addr = %self.address, status, "Backend back online")
            }
            _ => tracing::info!(backend = %self.name, addr = %self.address, status, "Server status"),
        }

        metrics::record_backend_alive(&self.address, alive);
        alive
    }
}

impl Upstream for Backend {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_alive(&self) -> bool {
        self.state.lock().alive
    }

    fn forward(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, ForwardError>> {
        self.forwarder.forward(&self.base_uri, request)
    }
}

/// Accept absolute `http` URLs with a host.
fn parse_address(address: &str) -> Result<Uri, LoadBalancerError> {
    let invalid = |reason: String| LoadBalancerError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    address.parse::<Uri>().map_err(|e| invalid(e.to_string()))
}
