//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Per-backend loop (active.rs):
//!     Ticker (health_check.interval_secs)
//!     → Backend::probe (GET base address, 5s deadline, 200 = alive)
//!     → Backend alive flag (under the backend's own lock)
//!     → Pool reads it on the next selection
//! ```
//!
//! # Design Decisions
//! - One task per backend; a slow probe never delays another backend
//! - Probes never take the pool lock
//! - Loops stop on the shared shutdown broadcast
//! - The first probe runs immediately at startup

pub mod active;

pub use active::HealthMonitor;
