//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from specific business logic.

pub mod cache;
pub mod headers;
pub mod listing;
pub mod mime;
pub mod path;
pub mod response;

// Re-export commonly used types
pub use headers::apply_fixed_headers;
pub use path::{resolve, Resolved};
pub use response::{
    build_304_response, build_404_response, build_405_response, build_file_response,
    build_json_response, build_options_response, build_redirect_response,
};
