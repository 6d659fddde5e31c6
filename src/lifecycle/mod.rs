//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Backend descriptors → Backends → Pool → Router
//!     → Health loops → Listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server drains, health loops and
//!     local backends exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Fail fast: any startup error is fatal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Balancer, StartupError};
