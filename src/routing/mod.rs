//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request
//!     → router.rs (RequestRouter::route)
//!     → Pool::select (one backend, RR or WRR)
//!     → forward span + log naming the destination
//!     → Backend::forward (hyper client)
//!     → Response, or RouteError for the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Every request goes to the single pool; there is no host/path matching
//! - Thin by intent: selection lives in load_balancer, bytes in http::client

pub mod router;

pub use router::{RequestRouter, RouteError};
