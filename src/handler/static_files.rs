//! Static file serving module
//!
//! Handles GET/HEAD for files under the root directory: path resolution,
//! MIME type detection, conditional requests, directory listings, and
//! response building.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, listing, mime, path::percent_decode, Resolved};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

/// Path served for a bare `/`
pub const ROOT_DOCUMENT: &str = "/index.html";

/// Serve a static file (GET or HEAD)
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let path = if ctx.path == "/" { ROOT_DOCUMENT } else { ctx.path };

    match http::resolve(&state.root, path, ctx.query, &state.config.http.index_files).await {
        Resolved::File {
            path: file_path,
            metadata,
        } => {
            let last_modified = metadata.modified().ok();
            if let Some(modified) = last_modified {
                if cache::is_not_modified(ctx.if_modified_since.as_deref(), modified) {
                    return http::build_304_response(&cache::format_http_date(modified));
                }
            }

            let content = match fs::read(&file_path).await {
                Ok(c) => c,
                Err(e) => {
                    logger::log_error(&format!(
                        "Failed to read file '{}': {}",
                        file_path.display(),
                        e
                    ));
                    return http::build_404_response();
                }
            };

            let last_modified = last_modified.map(cache::format_http_date);
            http::build_file_response(
                Bytes::from(content),
                mime::content_type_for(&file_path),
                last_modified.as_deref(),
                ctx.is_head,
            )
        }
        Resolved::Redirect(location) => http::build_redirect_response(&location),
        Resolved::Directory(dir) => match listing::read_entries(&dir, &state.root).await {
            Ok(entries) => {
                let display = percent_decode(path).unwrap_or_else(|| path.to_string());
                http::build_file_response(
                    Bytes::from(listing::render(&display, &entries)),
                    listing::CONTENT_TYPE,
                    None,
                    ctx.is_head,
                )
            }
            Err(e) => {
                logger::log_error(&format!("Failed to list '{}': {}", dir.display(), e));
                http::build_404_response()
            }
        },
        Resolved::Blocked => {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
            http::build_404_response()
        }
        Resolved::NotFound => http::build_404_response(),
    }
}
