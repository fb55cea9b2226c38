//! Request path resolution module
//!
//! Maps a request path onto a file under the root directory. The root is a
//! hard boundary: `..` segments are refused outright, and the canonical
//! target (symlinks resolved) must still lie inside the canonical root.

use std::fmt::Write as _;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of resolving a request path
#[derive(Debug)]
pub enum Resolved {
    /// Regular file inside the root
    File { path: PathBuf, metadata: Metadata },
    /// Directory requested without trailing slash; redirect target
    Redirect(String),
    /// Directory inside the root with no index file
    Directory(PathBuf),
    /// Nothing servable at this path
    NotFound,
    /// Path tried to leave the root
    Blocked,
}

/// Decode `%XX` escapes; `None` if the result is not UTF-8
///
/// Malformed escapes are kept verbatim.
pub fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).ok()
}

/// Encode a path for use in a URL, keeping unreserved characters and `/`
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/') {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Split a decoded path into segments that are safe to join onto the root
///
/// Returns `None` for anything that could name a location outside it.
pub fn safe_segments(decoded: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0', ':']) => return None,
            s => segments.push(s),
        }
    }
    Some(segments)
}

/// Resolve `request_path` (already stripped of its query) against `root`
///
/// `root` must be canonical. `query` is only used to preserve the query
/// string on directory redirects.
pub async fn resolve(
    root: &Path,
    request_path: &str,
    query: Option<&str>,
    index_files: &[String],
) -> Resolved {
    let Some(decoded) = percent_decode(request_path) else {
        return Resolved::NotFound;
    };
    let Some(segments) = safe_segments(&decoded) else {
        return Resolved::Blocked;
    };

    let target = segments
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment));

    // Missing files are the common 404 case
    let Some((canonical, metadata)) = canonical_within(root, &target).await else {
        return if fs::symlink_metadata(&target).await.is_ok() {
            Resolved::Blocked
        } else {
            Resolved::NotFound
        };
    };

    if metadata.is_file() {
        if request_path.ends_with('/') {
            return Resolved::NotFound;
        }
        return Resolved::File {
            path: canonical,
            metadata,
        };
    }

    if !metadata.is_dir() {
        return Resolved::NotFound;
    }

    if !request_path.ends_with('/') {
        let location = match query {
            Some(q) => format!("{request_path}/?{q}"),
            None => format!("{request_path}/"),
        };
        return Resolved::Redirect(location);
    }

    for index in index_files {
        if let Some((path, metadata)) = canonical_within(root, &canonical.join(index)).await {
            if metadata.is_file() {
                return Resolved::File { path, metadata };
            }
        }
    }

    Resolved::Directory(canonical)
}

/// Canonicalize `target` and stat it, provided it stays under `root`
async fn canonical_within(root: &Path, target: &Path) -> Option<(PathBuf, Metadata)> {
    let canonical = fs::canonicalize(target).await.ok()?;
    if !canonical.starts_with(root) {
        return None;
    }
    let metadata = fs::metadata(&canonical).await.ok()?;
    Some((canonical, metadata))
}
