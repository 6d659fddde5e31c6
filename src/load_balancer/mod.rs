//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (take the pool-wide cursor lock)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through live backends)
//!         - weighted.rs (rotate by weight slot, per-backend credit)
//!     → backend.rs (credit/liveness read under the backend's own lock)
//!     → Return one backend (or the fixed-position fallback)
//! ```
//!
//! # Design Decisions
//! - Two lock tiers: one pool-wide lock for the cursor, one lock per
//!   backend for credit/liveness, so probes never wait on scheduling
//! - Membership is fixed once the pool is built
//! - Algorithm chosen once at construction (`rr` or `wrr`)
//! - All-dead pools degrade to a fallback pick unless configured to fail

pub mod backend;
pub mod pool;
pub mod round_robin;
pub mod weighted;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;

use crate::http::client::ForwardError;

pub use backend::{Backend, BackendSnapshot};
pub use pool::Pool;

/// Errors raised while building a pool or selecting from it.
#[derive(Debug, thiserror::Error)]
pub enum LoadBalancerError {
    #[error("invalid backend address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("backend `{address}` has weight 0; weights must be >= 1")]
    InvalidWeight { address: String },

    #[error("backend pool is empty")]
    EmptyPool,

    #[error("no healthy backend available")]
    NoHealthyBackend,
}

/// Outcome of one scheduling pass.
#[derive(Debug, Clone)]
pub enum Selection {
    /// A live backend was granted the request.
    Live(Arc<Backend>),
    /// Nothing was alive; the algorithm's fixed-position pick.
    Fallback(Arc<Backend>),
}

impl Selection {
    pub fn backend(&self) -> &Arc<Backend> {
        match self {
            Selection::Live(b) | Selection::Fallback(b) => b,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Selection::Fallback(_))
    }
}

/// A scheduling algorithm.
///
/// Implementations run with the pool's cursor lock held; `cursor` is
/// always in `0..backends.len()` on entry and must be left that way.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next backend. `backends` is never empty.
    fn next_server(&self, cursor: &mut usize, backends: &[Arc<Backend>]) -> Selection;

    /// Short name used in logs ("rr", "wrr").
    fn name(&self) -> &'static str;
}

/// Anything the request path can route to.
pub trait Upstream: Send + Sync {
    /// Base address requests are forwarded to.
    fn address(&self) -> &str;

    /// Last observed liveness.
    fn is_alive(&self) -> bool;

    /// Hand the request to the forwarding capability bound to this upstream.
    /// No liveness check happens here.
    fn forward(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, ForwardError>>;
}
