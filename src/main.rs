//! Round-robin / weighted round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                   BALANCER                     │
//!   Client Request    │  ┌─────────┐    ┌───────────────┐              │
//!   ──────────────────┼─▶│  http   │───▶│ RequestRouter │              │
//!                     │  │ server  │    └───────┬───────┘              │
//!                     │  └─────────┘            │ select()             │
//!                     │                         ▼                      │
//!                     │                 ┌───────────────┐              │
//!                     │                 │ Pool (RR/WRR) │◀──┐          │
//!                     │                 └───────┬───────┘   │ alive    │
//!                     │                         │           │          │
//!   Client Response   │  ┌─────────┐    ┌───────▼───────┐ ┌─┴────────┐ │
//!   ◀─────────────────┼──│ forward │◀───│    Backend    │ │  health  │ │
//!                     │  └─────────┘    └───────────────┘ │  loops   │ │
//!                     │                                   └──────────┘ │
//!                     └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use tokio::net::TcpListener;

use wrr_proxy::config::{load_config, validate_config, BalancerConfig, CliOverrides, ConfigError};
use wrr_proxy::health::HealthMonitor;
use wrr_proxy::lifecycle::{signals, Balancer, Shutdown};
use wrr_proxy::observability::{logging, metrics};
use wrr_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "wrr-proxy")]
#[command(about = "Round-robin / weighted round-robin HTTP load balancer", long_about = None)]
struct Cli {
    /// Balancer configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: CliOverrides,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Probe every backend once, print their status and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };
    cli.overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("wrr-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        method = %config.method,
        environment = ?config.environment,
        health_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let balancer = Balancer::build(&config, &shutdown).await?;

    if let Some(Command::Check) = cli.command {
        let report = HealthMonitor::check_once(balancer.pool(), balancer.trace()).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        shutdown.trigger();
        return Ok(());
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let monitors = balancer.start_health_checks(&shutdown);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Serving requests");

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(balancer.router().clone());
    server.run(listener, shutdown.subscribe()).await?;

    // The server can also stop on its own; make sure the loops follow.
    shutdown.trigger();
    join_all(monitors).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
