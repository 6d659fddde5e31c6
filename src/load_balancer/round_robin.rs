//! Round-robin load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer, Selection};

/// Round-robin selector.
/// Walks the shared cursor forward, skipping dead backends.
#[derive(Debug, Default)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, cursor: &mut usize, backends: &[Arc<Backend>]) -> Selection {
        let len = backends.len();

        // The cursor moves past every position scanned, including the one returned.
        for _ in 0..len {
            let backend = &backends[*cursor];
            *cursor = (*cursor + 1) % len;
            if backend.grant_if_alive() {
                return Selection::Live(backend.clone());
            }
        }

        // Full lap: cursor is back where it started.
        Selection::Fallback(backends[*cursor].clone())
    }

    fn name(&self) -> &'static str {
        "rr"
    }
}
