//! Backend pool management.
//!
//! # Responsibilities
//! - Own the ordered, fixed set of backends
//! - Hold the shared cursor behind the pool-wide lock
//! - Run the configured algorithm as one critical section per selection
//! - Apply the all-dead policy (fallback pick or explicit error)

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::BalancingMethod;
use crate::load_balancer::{
    backend::{Backend, BackendSnapshot},
    round_robin::RoundRobin,
    weighted::WeightedRoundRobin,
    LoadBalancer, LoadBalancerError, Selection, Upstream,
};
use crate::observability::metrics;

/// An ordered pool of backends plus the scheduling cursor.
#[derive(Debug)]
pub struct Pool {
    backends: Vec<Arc<Backend>>,
    algorithm: Box<dyn LoadBalancer>,
    /// Always in `0..backends.len()`.
    cursor: Mutex<usize>,
    fail_when_unhealthy: bool,
}

impl Pool {
    /// Build a pool. Insertion order is scheduling order.
    pub fn new(backends: Vec<Arc<Backend>>, method: BalancingMethod) -> Result<Self, LoadBalancerError> {
        if backends.is_empty() {
            return Err(LoadBalancerError::EmptyPool);
        }

        let algorithm: Box<dyn LoadBalancer> = match method {
            BalancingMethod::RoundRobin => Box::new(RoundRobin::new()),
            BalancingMethod::WeightedRoundRobin => Box::new(WeightedRoundRobin::new()),
        };

        Ok(Self {
            backends,
            algorithm,
            cursor: Mutex::new(0),
            fail_when_unhealthy: false,
        })
    }

    /// Return [`LoadBalancerError::NoHealthyBackend`] instead of a fallback pick.
    pub fn fail_when_unhealthy(mut self, enabled: bool) -> Self {
        self.fail_when_unhealthy = enabled;
        self
    }

    /// Select the backend for one request.
    pub fn select(&self) -> Result<Arc<Backend>, LoadBalancerError> {
        let selection = {
            let mut cursor = self.cursor.lock();
            self.algorithm.next_server(&mut cursor, &self.backends)
        };

        match selection {
            Selection::Live(backend) => {
                metrics::record_selection(backend.address(), false);
                Ok(backend)
            }
            Selection::Fallback(backend) => {
                if self.fail_when_unhealthy {
                    tracing::warn!(algorithm = self.algorithm.name(), "No healthy backends, rejecting request");
                    return Err(LoadBalancerError::NoHealthyBackend);
                }
                tracing::warn!(
                    algorithm = self.algorithm.name(),
                    addr = %backend.address(),
                    "No healthy backends, falling back"
                );
                metrics::record_selection(backend.address(), true);
                Ok(backend)
            }
        }
    }

    /// Backends in scheduling order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn algorithm(&self) -> &'static str {
        self.algorithm.name()
    }

    pub fn cursor(&self) -> usize {
        *self.cursor.lock()
    }

    pub fn snapshot(&self) -> Vec<BackendSnapshot> {
        self.backends.iter().map(|b| b.snapshot()).collect()
    }
}
