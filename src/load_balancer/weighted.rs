//! Weighted round-robin load balancing strategy.
//!
//! Each backend may be granted `weight` requests per cycle, tracked in its
//! credit. The cursor moves past every granted backend, so one cycle hands
//! out slots one backend at a time (`A B C A B C A C A A` for weights
//! `[5, 2, 3]`) instead of draining each backend's weight in a burst.
//! When no live backend has credit left, all credits reset and the next
//! cycle starts again from the head of the pool.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer, Selection, Upstream};

/// Weighted round-robin selector.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin;

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for WeightedRoundRobin {
    fn next_server(&self, cursor: &mut usize, backends: &[Arc<Backend>]) -> Selection {
        let len = backends.len();

        // At most two laps: the current cycle, then a fresh one.
        for _ in 0..2 {
            for _ in 0..len {
                let backend = &backends[*cursor];
                *cursor = (*cursor + 1) % len;
                if backend.take_credit() {
                    return Selection::Live(backend.clone());
                }
            }

            if !backends.iter().any(|b| b.is_alive()) {
                break;
            }

            for backend in backends {
                backend.reset_credit();
            }
            *cursor = 0;
        }

        *cursor = (*cursor + 1) % len;
        Selection::Fallback(backends[*cursor].clone())
    }

    fn name(&self) -> &'static str {
        "wrr"
    }
}
