// Application state module
// Immutable per-process state shared by every connection

use std::path::PathBuf;

use super::types::Config;
use crate::error::ServerError;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical root directory; every served path must stay inside it
    pub root: PathBuf,
}

impl AppState {
    /// Resolve and validate the root directory, then freeze the configuration
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let configured = config.root_dir()?;
        let root = std::fs::canonicalize(&configured)
            .map_err(|e| ServerError::root_directory(&configured, e))?;

        if !root.is_dir() {
            return Err(ServerError::root_directory(
                &configured,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }

        Ok(Self { config, root })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("root", &self.root)
            .field("addr", &format_args!("{}:{}", self.config.server.host, self.config.server.port))
            .finish_non_exhaustive()
    }
}
