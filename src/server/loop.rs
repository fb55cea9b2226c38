// Server loop module
// Binds the listener and accepts connections until shutdown is signalled

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use super::listener::create_listener;
use crate::config::{AppState, Config};
use crate::error::ServerError;
use crate::logger;

/// A bound, not yet running, server
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl Server {
    /// Resolve the root directory and bind the configured address.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        let addr = config.get_socket_addr()?;
        let state = Arc::new(AppState::new(config)?);
        let listener = create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Accept connections until `shutdown` is notified.
    ///
    /// Connections still in flight are not awaited; they end when the
    /// runtime is dropped.
    pub async fn run(self, shutdown: Arc<Notify>) {
        let Self { listener, state } = self;

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                        Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                    }
                }

                () = shutdown.notified() => {
                    logger::log_shutdown("Shutdown requested");
                    break;
                }
            }
        }
    }
}
