//! Local development backends.
//!
//! Spawns `amount` tiny HTTP servers on `127.0.0.1`, each answering every
//! request with the port it serves on. Weights cycle through `[5, 2, 3]`.
//! Each server runs until the shared shutdown fires or its own
//! [`LocalBackend`] handle is stopped or dropped.

use std::io;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};

use crate::config::BackendConfig;
use crate::lifecycle::Shutdown;

/// Weights handed to local backends, in order.
pub const LOCAL_WEIGHTS: [u32; 3] = [5, 2, 3];

/// A running local backend.
#[derive(Debug)]
pub struct LocalBackend {
    descriptor: BackendConfig,
    stop: oneshot::Sender<()>,
}

impl LocalBackend {
    pub fn descriptor(&self) -> &BackendConfig {
        &self.descriptor
    }

    /// Stop this server without touching the others.
    pub fn stop(self) {
        let _ = self.stop.send(());
    }
}

/// Start local backends and return their handles.
///
/// Backend `i` binds `base_port + i`; with `base_port == 0` every backend
/// gets an ephemeral port. All of them stop on `shutdown`.
pub async fn spawn_local(amount: usize, base_port: u16, shutdown: &Shutdown) -> io::Result<Vec<LocalBackend>> {
    let mut backends = Vec::with_capacity(amount);

    for i in 0..amount {
        let port = if base_port == 0 {
            0
        } else {
            u16::try_from(i)
                .ok()
                .and_then(|offset| base_port.checked_add(offset))
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "local backend port out of range"))?
        };

        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let addr = listener.local_addr()?;
        let name = format!("Server {}", i + 1);

        tracing::info!(backend = %name, addr = %addr, "Spawning server");
        let (stop, stopped) = oneshot::channel();
        serve(listener, addr.port(), shutdown.subscribe(), stopped);

        backends.push(LocalBackend {
            descriptor: BackendConfig {
                address: format!("http://{}", addr),
                weight: LOCAL_WEIGHTS[i % LOCAL_WEIGHTS.len()],
                name: Some(name),
            },
            stop,
        });
    }

    Ok(backends)
}

fn serve(listener: TcpListener, port: u16, mut shutdown: broadcast::Receiver<()>, stopped: oneshot::Receiver<()>) {
    let app = Router::new().fallback(move || async move {
        let message = format!("Serving on port :{}", port);
        tracing::debug!("{}", message);
        message
    });

    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // A dropped handle counts as a stop.
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = stopped => {}
                }
            })
            .await;
        if let Err(e) = result {
            tracing::error!(port, error = %e, "Local backend stopped with error");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawned_backends_answer() {
        let shutdown = Shutdown::new();
        let backends = spawn_local(2, 0, &shutdown).await.unwrap();
        assert_eq!(backends.len(), 2);
        let first = backends[0].descriptor();
        assert_eq!(first.name.as_deref(), Some("Server 1"));
        assert_eq!(backends[1].descriptor().weight, 2);

        let body = reqwest::get(&first.address).await.unwrap().text().await.unwrap();
        let port = first.address.rsplit(':').next().unwrap();
        assert_eq!(body, format!("Serving on port :{}", port));

        shutdown.trigger();
    }
}
