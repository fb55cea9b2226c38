//! Server logging
//!
//! Lifecycle banners, per-request access lines and `[ERROR]`/`[WARN]`
//! messages, routed through [`writer`].

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{AppState, Config};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

use writer::Stream;

fn write_info(message: &str) {
    writer::emit(Stream::Access, message);
}

fn write_error(message: &str) {
    writer::emit(Stream::Error, message);
}

/// URLs an operator can open to reach the server bound on `addr`
pub fn access_urls(addr: &SocketAddr) -> Vec<String> {
    let port = addr.port();
    if addr.ip().is_unspecified() {
        vec![
            format!("http://localhost:{port}"),
            format!("http://<your-ip>:{port}"),
        ]
    } else {
        vec![format!("http://{addr}")]
    }
}

pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    let urls = access_urls(addr);
    write_info("======================================");
    write_info("Server started");
    if let Some(local) = urls.first() {
        write_info(&format!("Access at: {local}"));
    }
    if let Some(network) = urls.get(1) {
        write_info(&format!("From other computers: {network}"));
    }
    write_info(&format!("Root directory: {}", state.root.display()));
    if let Some(workers) = state.config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = state.config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = state.config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("Press Ctrl+C to stop the server");
    write_info("======================================\n");
}

fn signal_notice(signal: &str) -> String {
    format!("\n[SIGNAL] {signal} received")
}

pub fn log_signal(signal: &str) {
    write_info(&signal_notice(signal));
}

pub fn log_shutdown(reason: &str) {
    write_info(&format!("\n[Shutdown] {reason}, server stopped"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_fatal(err: &impl std::fmt::Display) {
    write_error(&format!("[FATAL] {err}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    writer::emit(Stream::Access, &entry.format(format));
}
