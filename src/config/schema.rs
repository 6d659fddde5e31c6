//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Scheduling algorithm.
    pub method: BalancingMethod,

    /// Where backends come from.
    pub environment: Environment,

    /// Local backend spawning (environment = "local").
    pub local: LocalConfig,

    /// Inline backend definitions (environment = "external").
    pub backends: Vec<BackendConfig>,

    /// Backend descriptor file (`.json`, `.yaml`, `.yml`), used when
    /// `backends` is empty.
    pub servers_path: Option<PathBuf>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Scheduler behavior.
    pub scheduler: SchedulerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:7000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7000".to_string(),
        }
    }
}

/// Load balancing method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
pub enum BalancingMethod {
    /// Round robin.
    #[default]
    #[serde(rename = "rr")]
    #[value(name = "rr")]
    RoundRobin,

    /// Weighted round robin.
    #[serde(rename = "wrr")]
    #[value(name = "wrr")]
    WeightedRoundRobin,
}

impl fmt::Display for BalancingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalancingMethod::RoundRobin => f.write_str("rr"),
            BalancingMethod::WeightedRoundRobin => f.write_str("wrr"),
        }
    }
}

/// Backend source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Spawn development backends in-process.
    #[default]
    Local,

    /// Use externally running servers.
    External,
}

/// Local backend spawning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Number of backends to spawn.
    pub amount: usize,

    /// Port of the first backend; backend `i` listens on `base_port + i`.
    pub base_port: u16,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            amount: 5,
            base_port: 8000,
        }
    }
}

/// Backend server descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL (e.g., "http://127.0.0.1:3000").
    #[serde(alias = "addr")]
    pub address: String,

    /// Weight for weighted round robin (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Display name; the positional index when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BackendConfig {
    pub fn new(address: impl Into<String>, weight: u32) -> Self {
        Self {
            address: address.into(),
            weight,
            name: None,
        }
    }
}

fn default_weight() -> u32 {
    1
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable background health checks.
    pub enabled: bool,

    /// Interval between probes of one backend, in seconds.
    pub interval_secs: u64,

    /// Path probed on each backend.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 20,
            path: "/".to_string(),
        }
    }
}

/// Scheduler behavior.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Answer 503 when no backend is alive instead of forwarding to the
    /// fallback pick.
    pub fail_when_unhealthy: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Also append logs to this file.
    pub log_file: Option<PathBuf>,

    /// Service name attached to request spans.
    pub service_name: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            service_name: "wrr-proxy".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
