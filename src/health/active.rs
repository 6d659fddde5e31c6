//! Active health checking.
//!
//! # Responsibilities
//! - Run one independent probe loop per backend
//! - Update backend liveness from probe results
//! - Stop every loop on the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;

use crate::config::HealthCheckConfig;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Backend, BackendSnapshot, Pool, Upstream};
use crate::observability::TraceContext;

/// Floor for the probe interval; `tokio::time::interval` panics on zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct HealthMonitor {
    pool: Arc<Pool>,
    interval: Duration,
    trace: TraceContext,
}

impl HealthMonitor {
    pub fn new(pool: Arc<Pool>, config: &HealthCheckConfig, trace: TraceContext) -> Self {
        Self {
            pool,
            interval: Duration::from_secs(config.interval_secs).max(MIN_INTERVAL),
            trace,
        }
    }

    /// Override the probe interval (sub-second intervals in tests).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start one loop per backend. Each exits when `shutdown` fires.
    pub fn spawn(self, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            backends = self.pool.len(),
            "Health monitor starting"
        );

        self.pool
            .backends()
            .iter()
            .map(|backend| {
                let backend = backend.clone();
                let trace = self.trace.clone();
                let rx = shutdown.subscribe();
                tokio::spawn(watch(backend, self.interval, trace, rx))
            })
            .collect()
    }

    /// Probe every backend once, concurrently, and report the result.
    pub async fn check_once(pool: &Pool, trace: &TraceContext) -> Vec<BackendSnapshot> {
        let probes = pool
            .backends()
            .iter()
            .map(|backend| backend.probe().instrument(trace.probe_span(backend)));
        join_all(probes).await;
        pool.snapshot()
    }
}

async fn watch(backend: Arc<Backend>, interval: Duration, trace: TraceContext, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.recv() => break,
        }

        tracing::info!(
            backend = %backend.name(),
            addr = %backend.address(),
            request_count = backend.request_count(),
            "Requests forwarded so far"
        );

        // A slow probe must not hold up shutdown.
        tokio::select! {
            _ = backend.probe().instrument(trace.probe_span(&backend)) => {}
            _ = shutdown.recv() => break,
        }
    }

    tracing::debug!(backend = %backend.name(), "Health loop stopped");
}
