//! Request dispatch.
//!
//! # Responsibilities
//! - Ask the pool for exactly one backend per request
//! - Emit the forward span/event naming the destination
//! - Hand the request to the backend's forwarding capability
//!
//! # Design Decisions
//! - No retry and no redirect on forward failure; the error goes back
//!   to the HTTP layer as-is
//! - Immutable after construction, shared via Arc

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use tracing::Instrument;

use crate::http::client::ForwardError;
use crate::http::X_REQUEST_ID;
use crate::load_balancer::{LoadBalancerError, Pool, Upstream};
use crate::observability::{metrics, TraceContext};

/// Why a request could not be served.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Select(#[from] LoadBalancerError),

    #[error("forward to {address} failed: {source}")]
    Forward {
        address: String,
        #[source]
        source: ForwardError,
    },
}

/// The request-path entry point.
#[derive(Debug)]
pub struct RequestRouter {
    pool: Arc<Pool>,
    trace: TraceContext,
}

impl RequestRouter {
    pub fn new(pool: Arc<Pool>, trace: TraceContext) -> Self {
        Self { pool, trace }
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    /// Select a backend and forward `request` to it.
    pub async fn route(&self, request: Request<Body>) -> Result<Response<Body>, RouteError> {
        let backend = self.pool.select()?;

        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let span = self.trace.forward_span(&request_id, &backend);
        async move {
            tracing::info!("Forwarding to {}", backend.address());

            backend.forward(request).await.map_err(|source| {
                tracing::error!(error = %source, "Upstream error");
                metrics::record_forward_error(backend.address());
                RouteError::Forward {
                    address: backend.address().to_string(),
                    source,
                }
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalancingMethod;
    use crate::http::client::Forward;
    use crate::load_balancer::Backend;
    use axum::http::{StatusCode, Uri};
    use futures_util::future::BoxFuture;
    use parking_lot::Mutex;

    /// Records where each request would have gone and answers 200.
    #[derive(Debug, Default)]
    struct RecordingForwarder {
        seen: Mutex<Vec<String>>,
    }

    impl Forward for RecordingForwarder {
        fn forward(&self, base: &Uri, _request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, ForwardError>> {
            self.seen.lock().push(base.to_string());
            Box::pin(async { Ok(Response::new(Body::from("ok"))) })
        }
    }

    #[derive(Debug)]
    struct FailingForwarder;

    impl Forward for FailingForwarder {
        fn forward(&self, _base: &Uri, _request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, ForwardError>> {
            Box::pin(async { Err(ForwardError::InvalidUri("boom".into())) })
        }
    }

    fn router(forwarder: Arc<dyn Forward>, method: BalancingMethod, weights: &[u32]) -> RequestRouter {
        let backends = weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Arc::new(Backend::new(i.to_string(), &format!("http://10.0.0.{}:80", i + 1), *w, forwarder.clone()).unwrap())
            })
            .collect();
        let pool = Pool::new(backends, method).unwrap();
        RequestRouter::new(Arc::new(pool), TraceContext::default())
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_routes_to_selected_backend() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let router = router(forwarder.clone(), BalancingMethod::WeightedRoundRobin, &[2, 1]);

        for _ in 0..3 {
            let response = router.route(request()).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(
            *forwarder.seen.lock(),
            ["http://10.0.0.1:80/", "http://10.0.0.2:80/", "http://10.0.0.1:80/"]
        );
    }

    #[tokio::test]
    async fn test_forward_failure_is_not_retried() {
        let router = router(Arc::new(FailingForwarder), BalancingMethod::RoundRobin, &[1, 1]);

        let err = router.route(request()).await.unwrap_err();
        assert!(matches!(err, RouteError::Forward { ref address, .. } if address == "http://10.0.0.1:80"));
        // The next request moves on; the failed one was not redirected.
        assert_eq!(router.pool().cursor(), 1);
    }

    #[tokio::test]
    async fn test_no_healthy_backend() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let backend = Arc::new(Backend::new("0", "http://10.0.0.1:80", 1, forwarder.clone()).unwrap());
        backend.set_alive(false);
        let pool = Pool::new(vec![backend], BalancingMethod::RoundRobin)
            .unwrap()
            .fail_when_unhealthy(true);
        let router = RequestRouter::new(Arc::new(pool), TraceContext::default());

        let err = router.route(request()).await.unwrap_err();
        assert!(matches!(err, RouteError::Select(LoadBalancerError::NoHealthyBackend)));
        assert!(forwarder.seen.lock().is_empty());
    }
}
