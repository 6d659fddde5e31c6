//! Command-line overrides.
//!
//! Only flags that were actually passed replace file values.

use std::path::PathBuf;

use clap::Args;

use crate::config::schema::{BalancerConfig, BalancingMethod, Environment};

/// Flags that override the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct CliOverrides {
    /// Load balancing method.
    #[arg(long, value_enum)]
    pub method: Option<BalancingMethod>,

    /// Spawn local backends or use external servers.
    #[arg(long, value_enum)]
    pub env: Option<Environment>,

    /// External servers descriptor file (JSON or YAML).
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Port the balancer listens on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Port of the first local backend.
    #[arg(long = "srv-port")]
    pub srv_port: Option<u16>,

    /// Number of local backends to spawn.
    #[arg(long)]
    pub amount: Option<usize>,

    /// Seconds between health checks.
    #[arg(long = "hc-interval")]
    pub hc_interval: Option<u64>,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut BalancerConfig) {
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(env) = self.env {
            config.environment = env;
        }
        if let Some(path) = &self.path {
            config.servers_path = Some(path.clone());
            // A descriptor file on the command line wins over inline backends.
            config.backends.clear();
        }
        if let Some(port) = self.port {
            config.listener.bind_address = replace_port(&config.listener.bind_address, port);
        }
        if let Some(port) = self.srv_port {
            config.local.base_port = port;
        }
        if let Some(amount) = self.amount {
            config.local.amount = amount;
        }
        if let Some(interval) = self.hc_interval {
            config.health_check.interval_secs = interval;
        }
    }
}

fn replace_port(bind_address: &str, port: u16) -> String {
    let host = bind_address.rsplit_once(':').map(|(host, _)| host).unwrap_or("0.0.0.0");
    format!("{}:{}", host, port)
}
