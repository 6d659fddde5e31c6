//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler, router, health loops produce:
//!     → logging.rs (structured log events, stdout + optional file)
//!     → metrics.rs (selection counters, liveness gauges)
//!     → tracing.rs (forward/probe spans from an explicit context)
//! ```
//!
//! # Design Decisions
//! - No global tracer handle; `TraceContext` is passed in at startup
//! - Metrics are cheap and optional (no recorder, no cost beyond a lookup)

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::tracing::TraceContext;
