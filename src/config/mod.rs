// Configuration module entry point
// Loads layered configuration and resolves the served root directory

mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, DEFAULT_PORT,
};

/// Config file looked up in the working directory (any extension `config` understands)
pub const DEFAULT_CONFIG_NAME: &str = "devserve";

/// Prefix for environment overrides, e.g. `DEVSERVE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "DEVSERVE";

impl Config {
    /// Load configuration from the default file name and environment
    pub fn load() -> Result<Self, ServerError> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; compiled-in defaults apply for every key it
    /// (and the environment) leaves unset.
    pub fn load_from(config_path: &str) -> Result<Self, ServerError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", types::DEFAULT_HOST)?
            .set_default("server.port", i64::from(types::DEFAULT_PORT))?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", types::DEFAULT_ACCESS_LOG_FORMAT)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", types::DEFAULT_READ_TIMEOUT)?
            .set_default("http.max_body_size", types::DEFAULT_MAX_BODY_SIZE)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| ServerError::invalid_address(&addr, e))
    }

    /// Root directory as configured, before canonicalization
    ///
    /// Falls back to the directory holding the running executable.
    pub fn root_dir(&self) -> Result<PathBuf, ServerError> {
        if let Some(root) = &self.server.root {
            return Ok(PathBuf::from(root));
        }

        let exe = std::env::current_exe()
            .map_err(|e| ServerError::root_directory("<current executable>", e))?;
        exe.parent().map(PathBuf::from).ok_or_else(|| {
            ServerError::root_directory(
                &exe,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "executable has no parent directory",
                ),
            )
        })
    }

    /// Convenience for tests and embedding: defaults rooted at `root`
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        let mut config = Self::default();
        config.server.root = Some(root.into().to_string_lossy().into_owned());
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("definitely-missing-devserve-config").unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, DEFAULT_PORT);
        assert!(cfg.server.root.is_none());
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.performance.keep_alive);
        assert_eq!(cfg.http.index_files, vec!["index.html", "index.htm"]);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::default();
        let addr = cfg.get_socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_invalid_socket_addr() {
        let mut cfg = Config::default();
        cfg.server.host = "not a host".to_string();
        let err = cfg.get_socket_addr().unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[test]
    fn test_root_dir_defaults_to_executable_dir() {
        let cfg = Config::default();
        let root = cfg.root_dir().unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(Some(root.as_path()), exe.parent());
    }

    #[test]
    fn test_with_root() {
        let cfg = Config::with_root("/srv/site");
        assert_eq!(cfg.root_dir().unwrap(), PathBuf::from("/srv/site"));
    }
}
