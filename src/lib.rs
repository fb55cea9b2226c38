//! Local static file server with a stub JSON save endpoint.
//!
//! Serves files from a root directory with caching disabled and CORS open,
//! and acknowledges `POST /api/save` JSON payloads without storing them.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

#[cfg(test)]
mod test_util;
