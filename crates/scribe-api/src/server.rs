//! HTTP server lifecycle.
//!
//! [`start_server`] binds the listener, serves the router and returns once
//! the shutdown future resolves and in-flight requests have drained.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Bind address for the SOW API.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host or IP to bind (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Parse `host:port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] if the host is not an IP
    /// literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e| ServerError::InvalidAddress {
            addr: raw.clone(),
            reason: format!("{e}"),
        })
    }
}

/// Serve the API until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::InvalidAddress`] or [`ServerError::Bind`] before
/// serving starts, and [`ServerError::Serve`] on a fatal I/O error.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(%addr, backend = state.store.backend_name(), "SOW API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!("SOW API drained and stopped");
    Ok(())
}

/// Failures while starting or running the API server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `host:port` is not a valid socket address.
    #[error("invalid listen address {addr}: {reason}")]
    InvalidAddress {
        /// The rejected address.
        addr: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The listener could not be bound.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// Address that was tried.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serving stopped on an I/O error.
    #[error("server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_all_interfaces() {
        let addr = ServerConfig::default().socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn hostname_is_rejected() {
        let config = ServerConfig {
            host: String::from("localhost"),
            port: 80,
        };
        assert!(matches!(
            config.socket_addr(),
            Err(ServerError::InvalidAddress { .. })
        ));
    }
}
