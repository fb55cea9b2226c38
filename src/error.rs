//! Startup and fatal error types
//!
//! Errors here end the process before (or instead of) serving. Per-request
//! failures never surface as `ServerError`; they are answered on the wire.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to load configuration: {source}")]
    Config {
        #[from]
        source: config::ConfigError,
    },

    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("root directory '{}' is not usable: {source}", path.display())]
    RootDirectory { path: PathBuf, source: io::Error },

    #[error("failed to initialize logger: {0}")]
    Logger(io::Error),

    #[error("failed to build runtime: {0}")]
    Runtime(io::Error),

    #[error("failed to register signal handler: {0}")]
    Signal(io::Error),
}

impl ServerError {
    pub fn invalid_address<S: ToString>(addr: &str, reason: S) -> Self {
        Self::InvalidAddress {
            addr: addr.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn root_directory<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::RootDirectory {
            path: path.into(),
            source,
        }
    }

    /// True when the failure happened before the listener existed
    pub const fn is_bind_failure(&self) -> bool {
        matches!(self, Self::Bind { .. } | Self::InvalidAddress { .. })
    }
}
