//! Request handler module
//!
//! Responsible for request routing dispatch: static file serving for GET/HEAD
//! and the stub `/api/save` endpoint for POST.

pub mod router;
pub mod save;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
pub use save::SaveError;
