//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! balancer.toml
//!     → loader.rs (parse & deserialize)
//!     → overrides.rs (apply command-line flags that were passed)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!
//! servers.json / servers.yaml (environment = "external")
//!     → loader.rs (descriptor list, names synthesized by position)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; membership never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Any configuration error is fatal before serving starts

pub mod loader;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_descriptors, ConfigError};
pub use overrides::CliOverrides;
pub use schema::{
    BackendConfig, BalancerConfig, BalancingMethod, Environment, HealthCheckConfig, ListenerConfig,
    LocalConfig, ObservabilityConfig, SchedulerConfig,
};
pub use validation::{validate_config, ValidationError};
