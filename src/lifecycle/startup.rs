//! Startup orchestration.
//!
//! # Responsibilities
//! - Acquire backend descriptors (spawn local servers or read external ones)
//! - Build backends, the pool, the trace context and the request router
//! - Start the health loops on request
//!
//! # Design Decisions
//! - Fail fast: the config is validated again here, so an invalid config
//!   never reaches the pool or the health loops
//! - A bad address, zero weight or empty pool aborts startup
//! - Local backends that fail their first probe are stopped and dropped
//!   before the pool is assembled

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::task::JoinHandle;

use crate::config::{
    load_descriptors, validate_config, BackendConfig, BalancerConfig, ConfigError, Environment, HealthCheckConfig,
    ValidationError,
};
use crate::health::HealthMonitor;
use crate::http::client::{Forward, HttpForwarder};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Backend, LoadBalancerError, Pool, Upstream};
use crate::observability::TraceContext;
use crate::routing::RequestRouter;
use crate::spawner::{self, LocalBackend};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    LoadBalancer(#[from] LoadBalancerError),

    #[error("failed to spawn local backends: {0}")]
    Spawn(#[source] std::io::Error),
}

/// The assembled scheduling core.
#[derive(Debug)]
pub struct Balancer {
    pool: Arc<Pool>,
    router: Arc<RequestRouter>,
    trace: TraceContext,
    health: HealthCheckConfig,
    /// Local backends kept in the pool; dropping a handle stops its server.
    local: Vec<LocalBackend>,
}

impl Balancer {
    pub async fn build(config: &BalancerConfig, shutdown: &Shutdown) -> Result<Self, StartupError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let (descriptors, local) = match config.environment {
            Environment::Local => {
                let local = spawner::spawn_local(config.local.amount, config.local.base_port, shutdown)
                    .await
                    .map_err(StartupError::Spawn)?;
                let descriptors: Vec<BackendConfig> = local.iter().map(|l| l.descriptor().clone()).collect();
                (descriptors, local)
            }
            Environment::External => (external_descriptors(config)?, Vec::new()),
        };
        let forwarder: Arc<dyn Forward> = Arc::new(HttpForwarder::new());

        let mut backends = Vec::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.iter().enumerate() {
            let backend = Backend::from_config(index, descriptor, forwarder.clone())?
                .with_probe_path(&config.health_check.path)?;
            tracing::info!(
                backend = %backend.name(),
                addr = %backend.address(),
                weight = backend.weight(),
                "Backend registered"
            );
            backends.push(Arc::new(backend));
        }

        let (backends, local) = if local.is_empty() {
            (backends, local)
        } else {
            let alive = join_all(backends.iter().map(|b| b.probe())).await;
            retain_alive(backends, local, &alive)
        };

        let pool = Pool::new(backends, config.method)?.fail_when_unhealthy(config.scheduler.fail_when_unhealthy);
        tracing::info!(
            algorithm = pool.algorithm(),
            backends = pool.len(),
            "Backend pool ready"
        );

        let pool = Arc::new(pool);
        let trace = TraceContext::new(config.observability.service_name.clone());
        let router = Arc::new(RequestRouter::new(pool.clone(), trace.clone()));

        Ok(Self {
            pool,
            router,
            trace,
            health: config.health_check.clone(),
            local,
        })
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    pub fn router(&self) -> &Arc<RequestRouter> {
        &self.router
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    /// Number of local backends still being served.
    pub fn local_backends(&self) -> usize {
        self.local.len()
    }

    /// Spawn the per-backend health loops, unless disabled.
    pub fn start_health_checks(&self, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        if !self.health.enabled {
            tracing::info!("Active health checks disabled");
            return Vec::new();
        }
        HealthMonitor::new(self.pool.clone(), &self.health, self.trace.clone()).spawn(shutdown)
    }
}

fn external_descriptors(config: &BalancerConfig) -> Result<Vec<BackendConfig>, StartupError> {
    if !config.backends.is_empty() {
        return Ok(config.backends.clone());
    }
    match &config.servers_path {
        Some(path) => Ok(load_descriptors(path)?),
        None => Err(ConfigError::Validation(vec![ValidationError::NoBackends]).into()),
    }
}

/// Keep the backends whose first probe succeeded; stop the servers of the rest.
fn retain_alive(
    backends: Vec<Arc<Backend>>,
    local: Vec<LocalBackend>,
    alive: &[bool],
) -> (Vec<Arc<Backend>>, Vec<LocalBackend>) {
    let mut kept_backends = Vec::with_capacity(backends.len());
    let mut kept_local = Vec::with_capacity(local.len());

    for ((backend, handle), alive) in backends.into_iter().zip(local).zip(alive) {
        if *alive {
            kept_backends.push(backend);
            kept_local.push(handle);
        } else {
            tracing::warn!(backend = %backend.name(), addr = %backend.address(), "Local backend failed its first probe, stopping it");
            handle.stop();
        }
    }

    (kept_backends, kept_local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalancingMethod;

    #[tokio::test]
    async fn test_external_backends_in_order() {
        let mut config = BalancerConfig::default();
        config.environment = Environment::External;
        config.method = BalancingMethod::WeightedRoundRobin;
        config.backends = vec![
            BackendConfig::new("http://127.0.0.1:18001", 2),
            BackendConfig::new("http://127.0.0.1:18002", 1),
        ];

        let balancer = Balancer::build(&config, &Shutdown::new()).await.unwrap();
        let names: Vec<_> = balancer.pool().backends().iter().map(|b| b.name().to_string()).collect();
        assert_eq!(names, ["0", "1"]);
        assert_eq!(balancer.pool().algorithm(), "wrr");
    }

    #[tokio::test]
    async fn test_bad_address_is_fatal() {
        let mut config = BalancerConfig::default();
        config.environment = Environment::External;
        config.backends = vec![BackendConfig::new("localhost:8000", 1)];

        let err = Balancer::build(&config, &Shutdown::new()).await.unwrap_err();
        assert!(matches!(
            err,
            StartupError::Config(ConfigError::Validation(ref errors))
                if matches!(errors[..], [ValidationError::BackendAddress { index: 0, .. }])
        ));
    }

    #[tokio::test]
    async fn test_zero_interval_rejected_before_health_loops() {
        let mut config = BalancerConfig::default();
        config.environment = Environment::External;
        config.backends = vec![BackendConfig::new("http://127.0.0.1:18001", 1)];
        config.health_check.interval_secs = 0;

        let err = Balancer::build(&config, &Shutdown::new()).await.unwrap_err();
        assert!(matches!(
            err,
            StartupError::Config(ConfigError::Validation(ref errors)) if errors[..] == [ValidationError::ZeroInterval]
        ));
    }

    #[tokio::test]
    async fn test_failed_local_backends_are_stopped() {
        let shutdown = Shutdown::new();
        let local = spawner::spawn_local(2, 0, &shutdown).await.unwrap();
        let forwarder: Arc<dyn Forward> = Arc::new(HttpForwarder::new());
        let backends: Vec<_> = local
            .iter()
            .enumerate()
            .map(|(i, l)| Arc::new(Backend::from_config(i, l.descriptor(), forwarder.clone()).unwrap()))
            .collect();
        let dropped = local[0].descriptor().address.clone();
        let kept = local[1].descriptor().address.clone();

        let (backends, local) = retain_alive(backends, local, &[false, true]);
        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].address(), kept);
        assert_eq!(local.len(), 1);

        let client = reqwest::Client::builder().pool_max_idle_per_host(0).build().unwrap();
        let mut stopped = false;
        for _ in 0..50 {
            if client.get(&dropped).send().await.is_err() {
                stopped = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(stopped, "dropped local backend still serving");
        assert!(client.get(&kept).send().await.unwrap().status().is_success());

        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_local_backends_spawned_and_probed() {
        let mut config = BalancerConfig::default();
        config.local.amount = 3;
        config.local.base_port = 0;
        let shutdown = Shutdown::new();

        let balancer = Balancer::build(&config, &shutdown).await.unwrap();
        let weights: Vec<_> = balancer.pool().backends().iter().map(|b| b.weight()).collect();
        assert_eq!(weights, [5, 2, 3]);
        assert!(balancer.pool().backends().iter().all(|b| b.is_alive()));
        assert_eq!(balancer.local_backends(), 3);

        shutdown.trigger();
    }
}
