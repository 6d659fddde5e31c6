//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite the inbound URI onto the chosen backend's base address
//! - Send the request with a shared hyper client
//! - Stream the backend response back unchanged
//!
//! No timeout is applied here; the backend decides how long a forward takes.

use axum::body::Body;
use axum::http::{uri::PathAndQuery, Request, Response, Uri};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Forwarding failures. Not retried; the caller sees them as a bad gateway.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to build upstream uri: {0}")]
    InvalidUri(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// The capability that moves a request to a backend.
pub trait Forward: Send + Sync + std::fmt::Debug {
    fn forward(&self, base: &Uri, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, ForwardError>>;
}

/// Plain-HTTP forwarder backed by hyper's pooled client.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
}

impl HttpForwarder {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }
}

impl Default for HttpForwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl Forward for HttpForwarder {
    fn forward(&self, base: &Uri, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, ForwardError>> {
        let client = self.client.clone();
        let target = upstream_uri(base, request.uri());

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();
            parts.uri = target?;

            let response = client.request(Request::from_parts(parts, body)).await?;
            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}

/// Join the backend base path with the inbound path and query.
pub fn upstream_uri(base: &Uri, inbound: &Uri) -> Result<Uri, ForwardError> {
    let inbound_pq = inbound.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let joined = format!("{}{}", base.path().trim_end_matches('/'), inbound_pq);

    let path_and_query: PathAndQuery = joined
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| ForwardError::InvalidUri(e.to_string()))?;

    let mut parts = base.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).map_err(|e| ForwardError::InvalidUri(e.to_string()))
}
